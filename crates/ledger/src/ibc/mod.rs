//! IBC plumbing the ICS-20 precompile drives: host identifier rules, channel and
//! connection state, denomination traces and the transfer keeper.

pub mod channel;
pub mod denom;
pub mod host;
pub mod transfer;

pub use channel::{Channel, ChannelKeeper, ConnectionEnd, Counterparty, MemoryChannelKeeper, State};
pub use denom::{derive_decimals_from_denom, Denom, Hop};
pub use host::{
    is_channel_id_format, validate_channel_identifier, validate_client_identifier,
    validate_port_identifier,
};
pub use transfer::{
    escrow_address, Height, MemoryTransferKeeper, MsgTransfer, MsgTransferResponse, PageRequest,
    PageResponse, TransferKeeper,
};

/// Port bound by the ICS-20 application.
pub const TRANSFER_PORT: &str = "transfer";

/// ICS-20 application version string.
pub const ICS20_VERSION: &str = "ics20-1";
