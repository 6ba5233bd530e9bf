//! Authentication service models

pub mod role;
pub mod token;
pub mod user;

// Re-export for convenience
pub use role::{Role, UnknownRole};
pub use token::{LoginForm, TokenResponse};
pub use user::{
    CreateUserRequest, CreatedUserResponse, NewUser, PasswordChange, UpdateUserRequest, User,
    UserChanges, UserResponse,
};
