/**
 * reservation.rs
 * Collision-free port reservation backed by held OS claims
 *
 * A port is reserved by binding an IPv4 loopback listener to port 0 and keeping
 * the listener open. Until the listener is closed the OS refuses any other IPv4
 * bind to that number, on 127.0.0.1 or 0.0.0.0, from this process or any other,
 * so the number can be handed to a test without a window in which someone else
 * grabs it. IPv6 binds such as [::1] are not covered by the claim.
 *
 * Example:
 * - reserve(3) → [41873, 38211, 45090], three listeners held
 * - release()  → listeners closed, numbers back in the ephemeral pool
 */

use std::collections::HashSet;
use std::io;
use std::net::{Ipv4Addr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::errors::{EnvError, Result};

/// Duplicate numbers tolerated within one reservation batch before giving up
pub const MAX_DUPLICATE_RETRIES: usize = 16;

/// Listeners currently held by claims in this process
static LIVE_CLAIMS: AtomicUsize = AtomicUsize::new(0);

/// Number of port claims currently held open in this process
///
/// Process-wide; only meaningful when nothing else is reserving concurrently.
pub fn live_claims() -> usize {
    LIVE_CLAIMS.load(Ordering::SeqCst)
}

/// One held OS claim on a port number
#[derive(Debug)]
pub struct PortClaim {
    port: u16,
    listener: Option<TcpListener>,
}

impl PortClaim {
    /// Take ownership of a bound listener, reading back its port
    pub fn from_listener(listener: TcpListener) -> io::Result<Self> {
        let port = listener.local_addr()?.port();
        LIVE_CLAIMS.fetch_add(1, Ordering::SeqCst);
        Ok(PortClaim {
            port,
            listener: Some(listener),
        })
    }

    /// Claim with no backing socket, for scripting sources in tests
    #[cfg(test)]
    pub(crate) fn detached(port: u16) -> Self {
        PortClaim {
            port,
            listener: None,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Close the listener. Returns true if it was still open.
    fn close(&mut self) -> bool {
        match self.listener.take() {
            Some(listener) => {
                drop(listener);
                LIVE_CLAIMS.fetch_sub(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

impl Drop for PortClaim {
    fn drop(&mut self) {
        self.close();
    }
}

/// Where port claims come from
///
/// Production code uses [`LoopbackSource`]; tests substitute sources that run
/// dry or hand back duplicates to exercise the failure paths.
pub trait PortSource {
    /// Obtain one claim on a currently unused port
    fn claim(&mut self) -> io::Result<PortClaim>;
}

/// Asks the OS for an ephemeral port on 127.0.0.1
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackSource;

impl PortSource for LoopbackSource {
    fn claim(&mut self) -> io::Result<PortClaim> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        PortClaim::from_listener(listener)
    }
}

/// Test whether a loopback bind to `port` would currently succeed
pub fn is_port_bindable(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// A fixed, ordered set of exclusively held ports
///
/// Order is significant: callers assign roles by position.
#[derive(Debug)]
pub struct ReservedPorts {
    ports: Vec<u16>,
    claims: Vec<PortClaim>,
    released: bool,
}

impl ReservedPorts {
    /// Reserve `count` distinct loopback ports
    ///
    /// # Example
    /// ```
    /// use testenv_core::ReservedPorts;
    ///
    /// let mut ports = ReservedPorts::reserve(2)?;
    /// assert_eq!(ports.len(), 2);
    /// ports.release();
    /// # Ok::<(), testenv_core::EnvError>(())
    /// ```
    pub fn reserve(count: usize) -> Result<Self> {
        Self::reserve_from(&mut LoopbackSource, count)
    }

    /// Reserve `count` distinct ports from an arbitrary source
    ///
    /// # Errors
    /// `ResourceExhausted` if the source fails, or keeps returning numbers
    /// already in this batch. Claims opened before the failure are closed
    /// when `claims` drops on the early return.
    pub fn reserve_from<S>(source: &mut S, count: usize) -> Result<Self>
    where
        S: PortSource + ?Sized,
    {
        let mut claims: Vec<PortClaim> = Vec::with_capacity(count);
        let mut seen: HashSet<u16> = HashSet::with_capacity(count);
        let mut duplicates = 0usize;

        while claims.len() < count {
            let claim = source.claim().map_err(|e| {
                EnvError::ResourceExhausted(format!(
                    "could not claim port {} of {}: {}",
                    claims.len() + 1,
                    count,
                    e
                ))
            })?;

            if !seen.insert(claim.port()) {
                duplicates += 1;
                debug!(port = claim.port(), duplicates, "discarding duplicate port claim");
                if duplicates > MAX_DUPLICATE_RETRIES {
                    return Err(EnvError::ResourceExhausted(format!(
                        "gave up after {} duplicate ports while reserving {}",
                        duplicates, count
                    )));
                }
                continue;
            }

            claims.push(claim);
        }

        let ports: Vec<u16> = claims.iter().map(PortClaim::port).collect();
        debug!(?ports, "reserved ports");

        Ok(ReservedPorts {
            ports,
            claims,
            released: false,
        })
    }

    /// Reserved port numbers in reservation order
    ///
    /// # Errors
    /// `InvalidState` once the set has been released
    pub fn ports(&self) -> Result<&[u16]> {
        if self.released {
            return Err(EnvError::InvalidState(
                "reserved ports have already been released".to_string(),
            ));
        }
        Ok(&self.ports)
    }

    /// Number of ports currently held; 0 once released
    pub fn len(&self) -> usize {
        if self.released {
            0
        } else {
            self.ports.len()
        }
    }

    /// True if nothing is held, including after release
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `port` is currently held by this set
    pub fn contains(&self, port: u16) -> bool {
        !self.released && self.ports.contains(&port)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close every held claim
    ///
    /// Every claim is visited even if an earlier one was already closed.
    /// Returns how many listeners this call closed; repeated calls return 0.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;

        let mut closed = 0;
        for claim in self.claims.iter_mut() {
            if claim.close() {
                closed += 1;
            }
        }
        self.claims.clear();

        debug!(ports = ?self.ports, closed, "released ports");
        closed
    }
}

impl Drop for ReservedPorts {
    fn drop(&mut self) {
        self.release();
    }
}
