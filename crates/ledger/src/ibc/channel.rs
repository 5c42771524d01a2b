use crate::{context::Context, error::LedgerError};
use core::fmt;
use serde::{Deserialize, Serialize};

const CHANNELS_PREFIX: &str = "ibc/channelEnds/ports";
const CONNECTIONS_PREFIX: &str = "ibc/connections";

/// Handshake state shared by channels and connections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    #[default]
    Uninitialized,
    Init,
    TryOpen,
    Open,
    Closed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "STATE_UNINITIALIZED_UNSPECIFIED",
            Self::Init => "STATE_INIT",
            Self::TryOpen => "STATE_TRYOPEN",
            Self::Open => "STATE_OPEN",
            Self::Closed => "STATE_CLOSED",
        };
        f.write_str(name)
    }
}

/// Remote end of a channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterparty {
    pub port_id: String,
    pub channel_id: String,
}

/// Channel end stored under `(port, channel)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub state: State,
    pub counterparty: Counterparty,
    /// Connections the channel runs over; the first one is used.
    pub connection_hops: Vec<String>,
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEnd {
    pub client_id: String,
    pub state: State,
}

/// Read access to channel and connection ends.
pub trait ChannelKeeper: Send + Sync + fmt::Debug {
    fn channel(
        &self,
        ctx: &mut Context,
        port_id: &str,
        channel_id: &str,
    ) -> Result<Option<Channel>, LedgerError>;

    fn connection(
        &self,
        ctx: &mut Context,
        connection_id: &str,
    ) -> Result<Option<ConnectionEnd>, LedgerError>;
}

/// Channel keeper backed by the context store.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryChannelKeeper;

impl MemoryChannelKeeper {
    pub fn set_channel(
        &self,
        ctx: &mut Context,
        port_id: &str,
        channel_id: &str,
        channel: &Channel,
    ) -> Result<(), LedgerError> {
        ctx.set_json(channel_key(port_id, channel_id), channel)
    }

    pub fn set_connection(
        &self,
        ctx: &mut Context,
        connection_id: &str,
        connection: &ConnectionEnd,
    ) -> Result<(), LedgerError> {
        ctx.set_json(connection_key(connection_id), connection)
    }
}

impl ChannelKeeper for MemoryChannelKeeper {
    fn channel(
        &self,
        ctx: &mut Context,
        port_id: &str,
        channel_id: &str,
    ) -> Result<Option<Channel>, LedgerError> {
        ctx.get_json(&channel_key(port_id, channel_id))
    }

    fn connection(
        &self,
        ctx: &mut Context,
        connection_id: &str,
    ) -> Result<Option<ConnectionEnd>, LedgerError> {
        ctx.get_json(&connection_key(connection_id))
    }
}

fn channel_key(port_id: &str, channel_id: &str) -> Vec<u8> {
    format!("{CHANNELS_PREFIX}/{port_id}/channels/{channel_id}").into_bytes()
}

fn connection_key(connection_id: &str) -> Vec<u8> {
    format!("{CONNECTIONS_PREFIX}/{connection_id}").into_bytes()
}
