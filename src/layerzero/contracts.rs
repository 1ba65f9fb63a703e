//! LayerZero contract interfaces
//!
//! Solidity interface definitions for the endpoint, its view contract, the ULN302
//! send/receive libraries, the DVN and the bridged OFT token.

use alloy::sol;

sol! {
    /// ULN configuration structure
    #[derive(Debug, PartialEq, Eq)]
    struct UlnConfig {
        uint64 confirmations;
        uint8 requiredDVNCount;
        uint8 optionalDVNCount;
        uint8 optionalDVNThreshold;
        address[] requiredDVNs;
        address[] optionalDVNs;
    }

    /// LayerZero origin
    #[derive(Debug, PartialEq, Eq)]
    struct Origin {
        uint32 srcEid;
        bytes32 sender;
        uint64 nonce;
    }

    /// LayerZero messaging fee
    #[derive(Debug)]
    struct MessagingFee {
        uint256 nativeFee;
        uint256 lzTokenFee;
    }

    /// Receipt returned by the endpoint for a sent message
    #[derive(Debug)]
    struct MessagingReceipt {
        bytes32 guid;
        uint64 nonce;
        MessagingFee fee;
    }

    /// OFT send parameters
    #[derive(Debug)]
    struct SendParam {
        uint32 dstEid;
        bytes32 to;
        uint256 amountLD;
        uint256 minAmountLD;
        bytes extraOptions;
        bytes composeMsg;
        bytes oftCmd;
    }

    /// OFT send receipt
    #[derive(Debug)]
    struct OFTReceipt {
        uint256 amountSentLD;
        uint256 amountReceivedLD;
    }

    /// Enforced options for a destination and message type
    #[derive(Debug, PartialEq, Eq)]
    struct EnforcedOptionParam {
        uint32 eid;
        uint16 msgType;
        bytes options;
    }

    /// LayerZero Endpoint V2 interface
    #[sol(rpc)]
    #[derive(Debug)]
    interface ILayerZeroEndpointV2 {
        event PacketSent(bytes encodedPayload, bytes options, address sendLibrary);

        event PacketDelivered(Origin origin, address receiver);

        function getReceiveLibrary(address _receiver, uint32 _eid) external view returns (address lib, bool isDefault);
        function lzReceive(Origin calldata _origin, address _receiver, bytes32 _guid, bytes calldata _message, bytes calldata _extraData) external payable;
    }

    /// Endpoint V2 view contract exposing the execution state machine
    #[sol(rpc)]
    interface IEndpointV2View {
        function executable(Origin memory _origin, address _receiver) external view returns (uint8);
    }

    /// SendUln302 fee events
    #[sol(rpc)]
    #[derive(Debug)]
    interface ISendUln302 {
        event DVNFeePaid(address[] requiredDVNs, address[] optionalDVNs, uint256[] fees);

        event ExecutorFeePaid(address executor, uint256 fee);
    }

    /// ReceiveUln302 interface
    #[sol(rpc)]
    #[derive(Debug)]
    interface IReceiveUln302 {
        event PayloadVerified(address dvn, bytes header, uint256 confirmations, bytes32 proofHash);

        function getUlnConfig(address _oapp, uint32 _remoteEid) external view returns (UlnConfig memory);
        function verify(bytes calldata _packetHeader, bytes32 _payloadHash, uint64 _confirmations) external;
        function verifiable(UlnConfig memory _config, bytes32 _headerHash, bytes32 _payloadHash) external view returns (bool);
        function commitVerification(bytes calldata _packetHeader, bytes32 _payloadHash) external;
    }

    /// DVN that attests payload hashes on a receive library
    #[sol(rpc)]
    interface IDVN {
        function verify(address _receiveLib, bytes calldata _packetHeader, bytes32 _payloadHash, uint64 _confirmations) external;
    }

    /// Bridged OFT token (optionally wrapping the native asset)
    #[sol(rpc)]
    #[derive(Debug)]
    interface IBridgedToken {
        event Transfer(address indexed from, address indexed to, uint256 value);

        event OFTSent(bytes32 indexed guid, uint32 dstEid, address indexed fromAddress, uint256 amountSentLD, uint256 amountReceivedLD);

        event OFTReceived(bytes32 indexed guid, uint32 srcEid, address indexed toAddress, uint256 amountReceivedLD);

        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function deposit() external payable;
        function quoteSend(SendParam calldata _sendParam, bool _payInLzToken) external view returns (MessagingFee memory);
        function send(SendParam calldata _sendParam, MessagingFee calldata _fee, address _refundAddress) external payable returns (MessagingReceipt memory, OFTReceipt memory);
        function isPeer(uint32 _eid, bytes32 _peer) external view returns (bool);
        function setPeer(uint32 _eid, bytes32 _peer) external;
        function setEnforcedOptions(EnforcedOptionParam[] calldata _enforcedOptions) external;
    }
}
