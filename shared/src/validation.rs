//! 请求体字段约束
//!
//! 每种请求一次性报告全部违反的约束，便于表单同时标出所有字段。

use crate::models::{
    CreateEmployeeRequest, CreateTaskRequest, LoginRequest, ParticipantInput, RegisterRequest,
    UpdateEmployeeRequest,
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Vec<FieldViolation>;

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// =========================================================
// 规则工具 (Rule Helpers)
// =========================================================

#[derive(Default)]
struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: String) {
        self.violations.push(FieldViolation::new(field, message));
    }

    /// 必填文本，字符数在闭区间内
    fn required_len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        if value.trim().is_empty() {
            self.fail(field, format!("{} is required", field));
            return;
        }
        self.len(field, value, min, max);
    }

    fn len(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let count = value.chars().count();
        if count < min || count > max {
            if min == 0 {
                self.fail(field, format!("{} must be at most {} characters", field, max));
            } else {
                self.fail(
                    field,
                    format!("{} must be between {} and {} characters", field, min, max),
                );
            }
        }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.fail(field, format!("{} is required", field));
        }
    }

    fn required_email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.fail(field, format!("{} is required", field));
        } else {
            self.email(field, value);
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !is_email(value) {
            self.fail(field, format!("{} is not a valid email address", field));
        }
    }

    fn finish(self) -> Vec<FieldViolation> {
        self.violations
    }
}

/// 恰好一个 `@`，两侧都不为空
fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

// =========================================================
// 请求规则 (Request Rules)
// =========================================================

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        c.required_len("name", &self.name, 2, 255);
        c.required_len("department", &self.department, 0, 100);
        c.required_len("position", &self.position, 0, 100);
        c.required_email("email", &self.email);
        c.required_len("password", &self.password, 8, 72);
        if self.confirm_password != self.password {
            c.fail("confirm_password", "passwords do not match".to_string());
        }
        c.finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        c.required_email("email", &self.email);
        c.required("password", &self.password);
        c.finish()
    }
}

impl Validate for CreateEmployeeRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        c.required_len("name", &self.name, 2, 255);
        c.required_len("department", &self.department, 0, 100);
        c.required_len("position", &self.position, 0, 100);
        c.required_email("email", &self.email);
        c.finish()
    }
}

impl Validate for UpdateEmployeeRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        if let Some(name) = &self.name {
            c.len("name", name, 2, 255);
        }
        if let Some(department) = &self.department {
            c.len("department", department, 0, 100);
        }
        if let Some(position) = &self.position {
            c.len("position", position, 0, 100);
        }
        if let Some(email) = &self.email {
            c.email("email", email);
        }
        c.finish()
    }
}

impl Validate for ParticipantInput {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        if self.employee_id.trim().is_empty() {
            c.fail("employee_id", "employee_id is required".to_string());
        } else if Uuid::parse_str(self.employee_id.trim()).is_err() {
            c.fail("employee_id", "employee_id must be a UUID".to_string());
        }
        c.finish()
    }
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Vec<FieldViolation> {
        let mut c = Checker::default();
        c.required_len("title", &self.title, 3, 500);
        c.required("description", &self.description);
        if !(0..=2).contains(&self.priority) {
            c.fail("priority", "priority must be between 0 and 2".to_string());
        }
        for (i, participant) in self.participants.iter().enumerate() {
            for v in participant.validate() {
                c.fail(&format!("participants[{}].{}", i, v.field), v.message);
            }
        }
        c.finish()
    }
}
