use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingRequiredFields { fields: Vec<&'static str> },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("admin key rejected")]
    Unauthorized,
    #[error("persistence failure: {0}")]
    Persistence(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized")]
    Unauthorized { correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text returned to callers. Detail stays in `message` for the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "Thiếu thông tin!",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::Internal { .. } => "Server error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Internal { .. } => 500,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Unauthorized => {
                Self::Unauthorized { correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn missing_fields_map_to_bad_request_with_localized_message() {
        let interface = ApplicationError::from(DomainError::MissingRequiredFields {
            fields: vec!["phone"],
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("phone")
        ));
        assert_eq!(interface.user_message(), "Thiếu thông tin!");
        assert_eq!(interface.status_code(), 400);
    }

    #[test]
    fn unauthorized_leaks_no_detail() {
        let interface = ApplicationError::Unauthorized.into_interface("req-2");

        assert_eq!(interface.user_message(), "Unauthorized");
        assert_eq!(interface.status_code(), 401);
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn persistence_error_maps_to_generic_server_error() {
        let interface = ApplicationError::Persistence("disk full".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { ref message, .. } if message == "disk full"));
        assert_eq!(interface.user_message(), "Server error");
        assert_eq!(interface.status_code(), 500);
    }
}
