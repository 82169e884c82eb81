//! 登录状态与观察者
//!
//! 两种状态：`Anonymous`（初始）和 `Authenticated(identity)`。
//! 每次状态切换后同步通知所有观察者，不保证顺序。

use crate::claims::{Identity, decode_claims};
use crate::storage::{KeyValueStorage, TokenStore};
use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Anonymous => None,
        }
    }
}

/// [`SessionNotifier::subscribe`] 返回的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Rc<dyn Fn(&AuthState)>;

pub struct SessionNotifier<S> {
    tokens: TokenStore<S>,
    state: RefCell<AuthState>,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_id: Cell<u64>,
}

impl<S: KeyValueStorage> SessionNotifier<S> {
    pub fn new(tokens: TokenStore<S>) -> Self {
        Self {
            tokens,
            state: RefCell::new(AuthState::Anonymous),
            observers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self, observer: impl Fn(&AuthState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    /// 根据已保存的令牌重新推导状态
    ///
    /// 不会失败：令牌缺失、无法解码、已过期或存储出错，一律视为 Anonymous。
    pub async fn restore_from_storage(&self) -> AuthState {
        let token = match self.tokens.load_access_token().await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("session restore: {}", e);
                None
            }
        };

        let state = match token {
            None => AuthState::Anonymous,
            Some(token) => match decode_claims(&token) {
                Ok(claims) if claims.is_expired_at(Utc::now()) => {
                    log::debug!("session restore: stored token has expired");
                    AuthState::Anonymous
                }
                Ok(claims) => AuthState::Authenticated(claims.identity()),
                Err(e) => {
                    log::debug!("session restore: {}", e);
                    AuthState::Anonymous
                }
            },
        };

        self.transition(state.clone());
        state
    }

    pub fn mark_authenticated(&self, identity: Identity) {
        self.transition(AuthState::Authenticated(identity));
    }

    pub fn mark_logged_out(&self) {
        self.transition(AuthState::Anonymous);
    }

    fn transition(&self, next: AuthState) {
        log::debug!(
            "auth state -> {}",
            if next.is_authenticated() { "authenticated" } else { "anonymous" }
        );
        *self.state.borrow_mut() = next.clone();

        // 先拷贝一份，观察者在回调里订阅或退订不会冲突
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, o)| o.clone())
            .collect();
        for observer in observers {
            observer(&next);
        }
    }
}
