//! User DTO
//!
//! ユーザーレコードは `composer` で合成した `UserDto` 型から生成する。
//!
//! ## 構成
//! - 基底型 `BaseUser`: `kind()` は常に `"user"`
//! - 拡張 `Timestamp`: 生成時刻を初期化状態に記録（データに `createdAt` があればそちらが優先）
//! - スキーマ: `id`（空でない文字列）、`name`（文字列）、`email`（メール形式）が必須
//!
//! ## 不変条件
//! - `UserDto` はスキーマ検証を通過したレコードからのみ作られる
//! - 生成後は変更できない（更新は新しい `UserDto` で置き換える）

use chrono::Utc;
use composer::{Behavior, Composer, ComposeResult, DerivedType, Instance, ValidationError};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// Derived type name
pub const USER_TYPE_NAME: &str = "UserDto";

/// Initialization state key written by the `Timestamp` mixin
pub const CREATED_AT_KEY: &str = "createdAt";

/// Structural schema for user records
pub fn user_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "name", "email"],
        "properties": {
            "id": {"type": "string", "minLength": 1},
            "name": {"type": "string"},
            "email": {"type": "string", "format": "email"}
        }
    })
}

/// Base type shared by every user record
pub fn base_user() -> Behavior {
    Behavior::base_type("BaseUser").with_operation("kind", |_, _| json!("user"))
}

/// Mixin recording when the record was constructed
pub fn timestamp() -> Behavior {
    Behavior::mixin("Timestamp")
        .with_initializer(|_, state| {
            state.insert(CREATED_AT_KEY.to_string(), json!(Utc::now().to_rfc3339()));
        })
        .with_operation("created_at", |instance, _| {
            instance.get(CREATED_AT_KEY).cloned().unwrap_or(Value::Null)
        })
}

/// Composed `UserDto` type; build once and share
#[derive(Debug, Clone)]
pub struct UserDtoType(DerivedType);

impl UserDtoType {
    pub fn new() -> ComposeResult<Self> {
        let ty = Composer::new(USER_TYPE_NAME)
            .arg(base_user())
            .arg(timestamp())
            .arg(user_schema())
            .build()?;
        Ok(Self(ty))
    }

    /// Validate and construct a user from an untyped record
    pub fn construct(&self, record: Value) -> Result<UserDto, ValidationError> {
        self.0.construct_value(record).map(UserDto)
    }

    pub fn derived_type(&self) -> &DerivedType {
        &self.0
    }
}

/// Validated, immutable user record
#[derive(Debug, Clone, PartialEq)]
pub struct UserDto(Instance);

impl UserDto {
    pub fn id(&self) -> &str {
        self.0.str_field("id").unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.0.str_field("name").unwrap_or_default()
    }

    pub fn email(&self) -> &str {
        self.0.str_field("email").unwrap_or_default()
    }

    /// Always `"user"` (from `BaseUser`)
    pub fn kind(&self) -> Option<String> {
        self.call_str("kind")
    }

    /// RFC 3339 construction time, or the record's own `createdAt`
    pub fn created_at(&self) -> Option<String> {
        self.call_str("created_at")
    }

    pub fn as_instance(&self) -> &Instance {
        &self.0
    }

    pub fn into_instance(self) -> Instance {
        self.0
    }

    fn call_str(&self, operation: &str) -> Option<String> {
        self.0
            .call(operation, &[])
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
    }
}

impl Serialize for UserDto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
