use alloy_primitives::Address;
use thiserror::Error;

/// Errors returned by the ledger keepers and the state context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Gas meter limit exceeded.
    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {consumed}")]
    OutOfGas {
        /// Operation that tripped the meter.
        descriptor: &'static str,
        /// Meter limit.
        limit: u64,
        /// Gas consumed including the failing charge.
        consumed: u64,
    },
    /// Commit or discard requested with no open branch.
    #[error("no open store branch")]
    NoOpenBranch,
    /// Pending writes were moved while a branch was still open above them.
    #[error("{0} store branches still open")]
    UnsettledBranch(usize),
    /// Stored bytes could not be decoded.
    #[error("failed to decode stored value: {0}")]
    Codec(String),
    /// Address is malformed or zero where it must not be.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Denomination fails validation.
    #[error("invalid denom: {0}")]
    InvalidDenom(String),
    /// Coin amount is zero, negative or does not fit.
    #[error("{0}: invalid coins")]
    InvalidCoins(String),
    /// Sender's spendable balance does not cover the amount.
    #[error("spendable balance {spendable} is smaller than {required}: insufficient funds")]
    InsufficientFunds {
        /// Spendable balance rendered as a coin.
        spendable: String,
        /// Requested amount rendered as a coin.
        required: String,
    },
    /// Recipient is a blocked module account.
    #[error("{0} is not allowed to receive funds: unauthorized")]
    BlockedRecipient(Address),
    /// Sends of this denomination are disabled.
    #[error("{0} transfers are currently disabled: send transactions are disabled")]
    SendDisabled(String),
    /// Allowance value rejected by the keeper.
    #[error("invalid allowance: {0}")]
    InvalidAllowance(String),
    /// No token pair registered for the contract address.
    #[error("token pair for address '{0}' not registered: token pair not found")]
    TokenPairNotFound(Address),
    /// Token pair exists but conversions are disabled.
    #[error("token pair for address '{0}' is disabled: erc20 token pair is disabled")]
    TokenPairDisabled(Address),
    /// Denomination does not carry a usable base unit.
    #[error("invalid base denomination: {0}")]
    InvalidBaseDenom(String),
    /// Decimals cannot be derived from the denomination prefix.
    #[error("invalid decimals: {0}")]
    InvalidDecimals(String),
    /// Denomination is not of the form `ibc/{hash}`.
    #[error("denomination not a valid IBC voucher: {0}")]
    NoIbcVoucherDenom(String),
    /// Denomination trace not registered.
    #[error("denomination not found")]
    DenomNotFound,
    /// Denomination hash is not 32 hex-encoded bytes.
    #[error("invalid denom trace hash {0}")]
    InvalidDenomHash(String),
    /// Denomination path cannot be parsed.
    #[error("invalid denomination trace: {0}")]
    InvalidDenomTrace(String),
    /// Host identifier failed validation.
    #[error("invalid identifier {id}: {reason}")]
    InvalidIdentifier {
        /// Offending identifier.
        id: String,
        /// Validation failure.
        reason: String,
    },
    /// No channel stored for the port and channel pair.
    #[error("port ID ({port}) channel ID ({channel}): channel not found")]
    ChannelNotFound {
        /// Source port.
        port: String,
        /// Source channel.
        channel: String,
    },
    /// Channel exists but is not `OPEN`.
    #[error("channel state is not OPEN (got {state}): port ID ({port}) channel ID ({channel})")]
    ChannelNotOpen {
        /// Source port.
        port: String,
        /// Source channel.
        channel: String,
        /// Observed state.
        state: String,
    },
    /// Connection referenced by a channel hop is missing.
    #[error("connection ID ({0}): connection not found")]
    ConnectionNotFound(String),
    /// Connection exists but is not `OPEN`.
    #[error("connection state is not OPEN (got {state}): connection ID ({connection})")]
    ConnectionNotOpen {
        /// Connection identifier.
        connection: String,
        /// Observed state.
        state: String,
    },
    /// Channel identifier is neither a v1 channel nor a v2 client.
    #[error("invalid channel ID ({0}) on v2 packet: invalid channel")]
    InvalidChannel(String),
    /// Transfer message fails stateless validation.
    #[error("invalid transfer message: {0}")]
    InvalidTransfer(String),
}
