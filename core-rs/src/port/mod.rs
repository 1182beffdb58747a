/**
 * port module
 * Exclusive port reservation for ephemeral test environments
 */

pub mod reservation;

pub use reservation::{
    is_port_bindable, live_claims, LoopbackSource, PortClaim, PortSource, ReservedPorts, MAX_DUPLICATE_RETRIES,
};
