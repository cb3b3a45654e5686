use thiserror::Error;

/// Result type alias using KronosError
pub type Result<T> = std::result::Result<T, KronosError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Normalization
    Normalization,
    DepthExceeded,

    // Tracking
    Conflict,

    // Configuration
    InvalidConfig,

    // Integration/IO
    Serialization,
    Persistence,
    ChangeLog,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Normalization => "ERR_NORMALIZATION",
            ExErrorKind::DepthExceeded => "ERR_DEPTH_EXCEEDED",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ChangeLog => "ERR_CHANGE_LOG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Structured view of a [`KronosError`] with classification fields for
/// programmatic handling and context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_type: Option<String>,
    entity_key: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_type: None,
            entity_key: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity type context
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Add entity key context
    pub fn with_entity_key(mut self, key: impl Into<String>) -> Self {
        self.entity_key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity type context, if any
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// Get the entity key context, if any
    pub fn entity_key(&self) -> Option<&str> {
        self.entity_key.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_type) = &self.entity_type {
            write!(f, " (entity_type: {})", entity_type)?;
        }
        if let Some(entity_key) = &self.entity_key {
            write!(f, " (entity_key: {})", entity_key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for Kronos operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KronosError {
    // ===== Normalization Errors =====
    /// No strategy could turn the entity into a canonical view
    #[error("Cannot normalize entity of type '{entity_type}': {reason}")]
    Normalization { entity_type: String, reason: String },

    /// Reflection recursed past the configured depth (likely a cyclic graph)
    #[error("Normalization of '{entity_type}' exceeded max depth {max_depth}")]
    DepthExceeded { entity_type: String, max_depth: usize },

    // ===== Tracking Errors =====
    /// A tracked snapshot diverges from the entity's current state
    #[error(
        "Entity {entity_key} is already tracked and has unlogged changes; \
         log the changes first or track with override"
    )]
    Conflict { entity_key: String },

    // ===== Configuration Errors =====
    /// Tracker configuration failed validation or parsing
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Collaborator Errors =====
    /// Snapshot store failure
    #[error("Snapshot store error in {op}: {message}")]
    Store { op: String, message: String },

    /// Change log backend failure
    #[error("Change log error in {op}: {message}")]
    ChangeLog { op: String, message: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from KronosError to ExError
impl From<KronosError> for ExError {
    fn from(err: KronosError) -> Self {
        match err {
            KronosError::Normalization {
                entity_type,
                reason,
            } => ExError::new(ExErrorKind::Normalization)
                .with_entity_type(entity_type)
                .with_op("entity_to_view")
                .with_message(reason),

            KronosError::DepthExceeded {
                entity_type,
                max_depth,
            } => ExError::new(ExErrorKind::DepthExceeded)
                .with_entity_type(entity_type)
                .with_op("entity_to_view")
                .with_message(format!("Reflection exceeded max depth {}", max_depth)),

            KronosError::Conflict { entity_key } => ExError::new(ExErrorKind::Conflict)
                .with_entity_key(entity_key)
                .with_op("track_entity")
                .with_message("Tracked snapshot has unlogged changes"),

            KronosError::InvalidConfig { reason } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(reason)
            }

            KronosError::Store { op, message } => ExError::new(ExErrorKind::Persistence)
                .with_op(op)
                .with_message(message),

            KronosError::ChangeLog { op, message } => ExError::new(ExErrorKind::ChangeLog)
                .with_op(op)
                .with_message(message),

            KronosError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            KronosError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for KronosError {
    fn from(err: serde_json::Error) -> Self {
        KronosError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for KronosError {
    fn from(err: toml::de::Error) -> Self {
        KronosError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
