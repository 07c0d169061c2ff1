use thiserror::Error;

use crate::model::entity::{ApplyStatus, TicketStage};

pub type ApplyOrderResult<T> = Result<T, ApplyOrderException>;

#[derive(Error, Debug)]
pub enum ApplyOrderException {
    #[error("There is no ticket with order id: {order_id}.")]
    TicketNotFound { order_id: u64 },

    #[error("There is no suborder with id: {suborder_id}.")]
    SubOrderNotFound { suborder_id: String },

    #[error("There is no {step_name} step of suborder: {suborder_id}.")]
    StepNotFound {
        suborder_id: String,
        step_name: String,
    },

    #[error("Ticket: {order_id} is at stage {stage:?}, expected one of {expected:?}.")]
    InvalidTicketStage {
        order_id: u64,
        stage: TicketStage,
        expected: Vec<TicketStage>,
    },

    #[error("Suborder: {suborder_id} is at stage {stage:?}, expected one of {expected:?}.")]
    InvalidOrderStage {
        suborder_id: String,
        stage: TicketStage,
        expected: Vec<TicketStage>,
    },

    #[error("Suborder: {suborder_id} has status {status:?}, expected one of {expected:?}.")]
    InvalidOrderStatus {
        suborder_id: String,
        status: ApplyStatus,
        expected: Vec<ApplyStatus>,
    },

    #[error("Replicas {replicas} of suborder: {suborder_id} must be positive and, with {success_num} delivered, not exceed {origin_num}.")]
    InvalidReplicas {
        suborder_id: String,
        replicas: u32,
        success_num: u32,
        origin_num: u32,
    },

    #[error("Suborder: {suborder_id} would use {required} cores, only {applied} were applied.")]
    CoreExceeded {
        suborder_id: String,
        required: u64,
        applied: u64,
    },

    #[error("Device type {device_type} is not in device group {expected}.")]
    DeviceGroupMismatch {
        device_type: String,
        expected: String,
    },

    #[error("Device type {device_type} is not of core size {expected}.")]
    DeviceSizeMismatch {
        device_type: String,
        expected: String,
    },

    #[error("Region of suborder: {suborder_id} can not change from {from} to {to}.")]
    RegionImmutable {
        suborder_id: String,
        from: String,
        to: String,
    },

    #[error("Upgrade suborder: {suborder_id} can not be modified.")]
    UpgradeNotModifiable { suborder_id: String },

    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("User: {user} is not allowed to {action}.")]
    PermissionDenied { user: String, action: String },

    #[error("ITSM ticket: {itsm_ticket_id} can not be cancelled: {reason}")]
    ItsmNotCancellable {
        itsm_ticket_id: String,
        reason: String,
    },

    #[error("Generation record: {generate_id} of suborder: {suborder_id} has no CRP task yet.")]
    GenerationNotReady {
        suborder_id: String,
        generate_id: u64,
    },

    #[error("There is no generator for resource type: {resource_type}.")]
    UnsupportedResourceType { resource_type: String },

    #[error("Timed out after {secs}s: {operation}")]
    Timeout { operation: String, secs: u64 },

    #[error("External service {service} failed: {source}")]
    External {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Revoking CRP tasks failed: {}", failures.join("; "))]
    RevokeFailed { failures: Vec<String> },

    #[error("Apply order internal error: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl ApplyOrderException {
    pub fn external(service: &str, source: anyhow::Error) -> Self {
        Self::External {
            service: service.to_owned(),
            source,
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Numeric code surfaced to API callers.
    pub fn status(&self) -> u16 {
        match self {
            Self::TicketNotFound { .. } => 1000,
            Self::SubOrderNotFound { .. } => 1001,
            Self::StepNotFound { .. } => 1002,
            Self::InvalidTicketStage { .. } => 1010,
            Self::InvalidOrderStage { .. } => 1011,
            Self::InvalidOrderStatus { .. } => 1012,
            Self::InvalidReplicas { .. } => 1020,
            Self::CoreExceeded { .. } => 1021,
            Self::DeviceGroupMismatch { .. } => 1022,
            Self::DeviceSizeMismatch { .. } => 1023,
            Self::RegionImmutable { .. } => 1024,
            Self::UpgradeNotModifiable { .. } => 1025,
            Self::Validation { .. } => 1026,
            Self::PermissionDenied { .. } => 1030,
            Self::ItsmNotCancellable { .. } => 1031,
            Self::GenerationNotReady { .. } => 1032,
            Self::UnsupportedResourceType { .. } => 1033,
            Self::Timeout { .. } => 1040,
            Self::External { .. } => 1050,
            Self::RevokeFailed { .. } => 1051,
            Self::InternalError { .. } => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TicketNotFound { .. } | Self::SubOrderNotFound { .. } | Self::StepNotFound { .. }
        )
    }
}

impl From<anyhow::Error> for ApplyOrderException {
    fn from(e: anyhow::Error) -> Self {
        ApplyOrderException::InternalError { source: e }
    }
}
