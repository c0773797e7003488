pub mod enrollment;

pub use enrollment::{
    Confirmation, EnrollmentService, FinalizedPayment, GatewaySession, GatewaySessionRequest,
};
