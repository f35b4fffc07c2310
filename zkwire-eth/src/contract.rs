//! Solidity interface of EIP-1271 contract wallets.

use alloy_sol_types::sol;

/// Value `isValidSignature` returns for an accepted signature.
pub const EIP1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

sol! {
    /// Standard signature validation method for contracts.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-1271>
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEIP1271 {
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4 magicValue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_magic_value_is_selector() {
        assert_eq!(IEIP1271::isValidSignatureCall::SELECTOR, EIP1271_MAGIC_VALUE);
    }
}
