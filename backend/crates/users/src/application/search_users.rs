//! Search Users Use Case
//!
//! Wildcard search over `name` and `email`.
//!
//! ## 検索規則
//! - `*` は任意の文字列にマッチ、それ以外の文字はすべてリテラル
//! - 大文字小文字を区別しない
//! - 部分一致（`gr` は `Grace` にマッチする）

use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::domain::store::UserStore;
use crate::domain::user::UserDto;
use crate::error::{UserError, UserResult};

/// Search users use case
pub struct SearchUsersUseCase<S>
where
    S: UserStore,
{
    store: Arc<S>,
}

impl<S> SearchUsersUseCase<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, query: &str) -> UserResult<Vec<UserDto>> {
        if query.is_empty() {
            return Err(UserError::MissingQuery);
        }
        let matcher = wildcard_regex(query)?;

        let found: Vec<UserDto> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|user| matcher.is_match(user.name()) || matcher.is_match(user.email()))
            .collect();

        tracing::debug!(query, matches = found.len(), "User search");

        Ok(found)
    }
}

/// Translate a `*` wildcard query into a case-insensitive regex
pub fn wildcard_regex(query: &str) -> Result<Regex, regex::Error> {
    let pattern = query
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}
