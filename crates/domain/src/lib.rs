pub mod access;
pub mod boards;
pub mod error;
pub mod identity;
pub mod limits;
pub mod moderation;
pub mod notifications;
pub mod ports;
pub mod posts;
pub mod screening;
pub mod util;

#[cfg(test)]
pub(crate) mod mocks;

pub type DomainResult<T> = Result<T, error::DomainError>;
