//! Events delivered to the reducer.
//!
//! On the wire an event is `{"type": ..., "params": {...}, "timestamp": ...}`.
//! Kinds the engine does not know decode to [`EventKind::Unknown`] so that a
//! newer client cannot break an older engine; they are accepted and ignored.

use crate::rng::Seed;
use crate::user::UserId;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors decoding an event
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid params for {kind}: {source}")]
    InvalidParams {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Params of `submit_bid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidParams {
    pub user_id: UserId,
    /// Whole units of money. A fractional amount such as `12.5` does not
    /// decode and the event is reported as [`EventError::InvalidParams`].
    pub bid_amount: i64,
}

/// Params of `update_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNameParams {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// Params of `step`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
}

/// Params of `start_auction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAuctionParams {
    pub user_id: UserId,
    /// Index into the auctioneer's hand
    pub idx: usize,
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Give everyone starting money and open round 0
    StartGame,
    /// Bid on the current auction
    SubmitBid(BidParams),
    /// Settle the current auction
    FinishAuction,
    /// Add a user or rename one
    UpdateName(UpdateNameParams),
    /// Run the next automatic step (dealing)
    Step(StepParams),
    /// Offer a painting from hand
    StartAuction(StartAuctionParams),
    /// A kind this engine does not know
    Unknown { kind: String, params: Value },
}

impl EventKind {
    /// Wire name of this kind
    pub fn name(&self) -> &str {
        match self {
            EventKind::StartGame => "start_game",
            EventKind::SubmitBid(_) => "submit_bid",
            EventKind::FinishAuction => "finish_auction",
            EventKind::UpdateName(_) => "update_name",
            EventKind::Step(_) => "step",
            EventKind::StartAuction(_) => "start_auction",
            EventKind::Unknown { kind, .. } => kind,
        }
    }

    fn decode(kind: String, params: Value) -> Result<Self, EventError> {
        // an absent params object means "no params"
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };

        fn parse<T: for<'de> Deserialize<'de>>(kind: &str, params: Value) -> Result<T, EventError> {
            serde_json::from_value(params).map_err(|source| EventError::InvalidParams {
                kind: kind.to_string(),
                source,
            })
        }

        Ok(match kind.as_str() {
            "start_game" => EventKind::StartGame,
            "finish_auction" => EventKind::FinishAuction,
            "submit_bid" => EventKind::SubmitBid(parse(&kind, params)?),
            "update_name" => EventKind::UpdateName(parse(&kind, params)?),
            "step" => EventKind::Step(parse(&kind, params)?),
            "start_auction" => EventKind::StartAuction(parse(&kind, params)?),
            _ => EventKind::Unknown { kind, params },
        })
    }

    fn params(&self) -> Value {
        let encoded = match self {
            EventKind::StartGame | EventKind::FinishAuction => return Value::Null,
            EventKind::SubmitBid(p) => serde_json::to_value(p),
            EventKind::UpdateName(p) => serde_json::to_value(p),
            EventKind::Step(p) => serde_json::to_value(p),
            EventKind::StartAuction(p) => serde_json::to_value(p),
            EventKind::Unknown { params, .. } => return params.clone(),
        };
        // plain structs of strings and integers always encode
        encoded.unwrap_or(Value::Null)
    }
}

/// An event with its optional client timestamp (milliseconds since epoch)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawEvent", try_from = "RawEvent")]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: Option<i64>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: None,
        }
    }

    pub fn start_game() -> Self {
        Self::new(EventKind::StartGame)
    }

    pub fn submit_bid(user_id: impl Into<UserId>, bid_amount: i64) -> Self {
        Self::new(EventKind::SubmitBid(BidParams {
            user_id: user_id.into(),
            bid_amount,
        }))
    }

    pub fn finish_auction() -> Self {
        Self::new(EventKind::FinishAuction)
    }

    pub fn update_name(
        id: impl Into<UserId>,
        name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::UpdateName(UpdateNameParams {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
        }))
    }

    pub fn step(seed: Option<Seed>) -> Self {
        Self::new(EventKind::Step(StepParams { seed }))
    }

    pub fn start_auction(user_id: impl Into<UserId>, idx: usize) -> Self {
        Self::new(EventKind::StartAuction(StartAuctionParams {
            user_id: user_id.into(),
            idx,
        }))
    }

    /// Attach a client timestamp
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Decode an event from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        let raw: RawEvent = serde_json::from_str(json)?;
        Event::try_from(raw)
    }

    /// Wire name of the event kind
    pub fn name(&self) -> &str {
        self.kind.name()
    }
}

/// Wire shape of an event
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    params: Value,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    timestamp: Option<i64>,
}

/// Numbers become millisecond timestamps; anything else is treated as absent
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)))
}

impl TryFrom<RawEvent> for Event {
    type Error = EventError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        Ok(Event {
            kind: EventKind::decode(raw.kind, raw.params)?,
            timestamp: raw.timestamp,
        })
    }
}

impl From<Event> for RawEvent {
    fn from(event: Event) -> Self {
        RawEvent {
            kind: event.kind.name().to_string(),
            params: event.kind.params(),
            timestamp: event.timestamp,
        }
    }
}
