//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `ConfigContractApi`
//! - **Driven Ports (Outbound)**: `GovernanceCollaborator`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
