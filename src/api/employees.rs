use super::{ApiClient, ListQuery};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::request::{HttpClient, HttpMethod};
use taskmanager_shared::{
    CreateEmployeeRequest, Employee, PaginatedResponse, UpdateEmployeeRequest,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeQuery {
    pub paging: ListQuery,
    pub department: Option<String>,
}

impl EmployeeQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.paging.pairs();
        if let Some(department) = self.department.as_deref().filter(|d| !d.is_empty()) {
            pairs.push(("department", department.to_string()));
        }
        pairs
    }
}

/// 员工接口
pub struct EmployeeClient<C> {
    api: ApiClient<C>,
}

impl<C: HttpClient> EmployeeClient<C> {
    pub fn new(http: C, config: ClientConfig) -> Self {
        Self {
            api: ApiClient::new(http, config),
        }
    }

    pub async fn list(&self, query: &EmployeeQuery) -> ClientResult<PaginatedResponse<Employee>> {
        let req = self
            .api
            .request_with_query(HttpMethod::Get, "employees", &query.pairs())?;
        self.api
            .call(req, "employees.list", "could not load employees")
            .await
    }

    pub async fn get(&self, id: Uuid) -> ClientResult<Employee> {
        let req = self.api.request(HttpMethod::Get, &format!("employees/{}", id))?;
        self.api
            .call(req, "employees.get", "employee not found")
            .await
    }

    pub async fn create(&self, body: &CreateEmployeeRequest) -> ClientResult<Employee> {
        let req = self
            .api
            .request(HttpMethod::Post, "employees")?
            .with_json(body)?;
        self.api
            .call(req, "employees.create", "could not create employee")
            .await
    }

    pub async fn update(&self, id: Uuid, body: &UpdateEmployeeRequest) -> ClientResult<Employee> {
        let req = self
            .api
            .request(HttpMethod::Put, &format!("employees/{}", id))?
            .with_json(body)?;
        self.api
            .call(req, "employees.update", "could not update employee")
            .await
    }

    /// 只检查状态码，响应不带数据
    pub async fn delete(&self, id: Uuid) -> ClientResult<()> {
        let req = self
            .api
            .request(HttpMethod::Delete, &format!("employees/{}", id))?;
        self.api.execute(req, "employees.delete").await?;
        Ok(())
    }
}
