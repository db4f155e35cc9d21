//! Cross-crate integration flows.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod barrier;
#[cfg(test)]
mod cross_host_transfer;
#[cfg(test)]
mod same_host_transfer;
#[cfg(test)]
mod session_state;
#[cfg(test)]
mod wire;
