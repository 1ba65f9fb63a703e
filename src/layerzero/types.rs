use alloy::primitives::{Address, B256};
use strum::Display;

/// LayerZero Endpoint ID (EID) - unique identifier for each blockchain in the LayerZero network.
pub type EndpointId = u32;

/// Execution state of a packet as reported by `EndpointV2View.executable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExecutionState {
    /// Not yet verified (or the nonce is not the next lazy inbound nonce).
    NotExecutable,
    /// Verified, but an earlier nonce still blocks execution.
    VerifiedButNotExecutable,
    /// Verified and committed; `lzReceive` can be called.
    Executable,
    /// Already delivered.
    Executed,
}

impl ExecutionState {
    /// Whether the packet still has to go through DVN verification and commit.
    pub fn needs_verification(self) -> bool {
        matches!(self, Self::NotExecutable | Self::VerifiedButNotExecutable)
    }
}

impl TryFrom<u8> for ExecutionState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotExecutable),
            1 => Ok(Self::VerifiedButNotExecutable),
            2 => Ok(Self::Executable),
            3 => Ok(Self::Executed),
            other => Err(other),
        }
    }
}

/// Left-pads an address to the 32-byte form LayerZero uses for peers and senders.
pub fn address_to_bytes32(address: Address) -> B256 {
    address.into_word()
}

/// Takes the low 20 bytes of a 32-byte LayerZero address.
pub fn bytes32_to_address(word: B256) -> Address {
    Address::from_word(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn execution_state_discriminants() {
        assert_eq!(ExecutionState::try_from(0), Ok(ExecutionState::NotExecutable));
        assert_eq!(ExecutionState::try_from(1), Ok(ExecutionState::VerifiedButNotExecutable));
        assert_eq!(ExecutionState::try_from(2), Ok(ExecutionState::Executable));
        assert_eq!(ExecutionState::try_from(3), Ok(ExecutionState::Executed));
        assert_eq!(ExecutionState::try_from(4), Err(4));
    }

    #[test]
    fn verification_needed_only_before_execution() {
        assert!(ExecutionState::NotExecutable.needs_verification());
        assert!(ExecutionState::VerifiedButNotExecutable.needs_verification());
        assert!(!ExecutionState::Executable.needs_verification());
        assert!(!ExecutionState::Executed.needs_verification());
    }

    #[test]
    fn pads_address_on_the_left() {
        let addr = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let word = address_to_bytes32(addr);

        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], addr.as_slice());
        assert_eq!(bytes32_to_address(word), addr);
    }
}
