/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one `ask` call. Unique across every actor of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction of an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    /// A query delivered to a unit.
    Request,
    /// A unit's answer to an earlier request.
    Response,
}

/// A payload tagged for request/response correlation.
///
/// Requests reach the unit through
/// [`ExecutionUnit::request`](crate::unit::ExecutionUnit::request); the unit
/// answers, now or during any later call, with
/// [`Effects::respond_to`](crate::unit::Effects::respond_to) or
/// [`Effects::reply`](crate::unit::Effects::reply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    kind: EnvelopeKind,
    correlation_id: CorrelationId,
    payload: P,
}

impl<P> Envelope<P> {
    /// Tags `payload` as a request.
    pub const fn request(correlation_id: CorrelationId, payload: P) -> Self {
        Self {
            kind: EnvelopeKind::Request,
            correlation_id,
            payload,
        }
    }

    /// Tags `payload` as the response to `correlation_id`.
    pub const fn response(correlation_id: CorrelationId, payload: P) -> Self {
        Self {
            kind: EnvelopeKind::Response,
            correlation_id,
            payload,
        }
    }

    /// Request or response.
    pub const fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    /// The correlation id.
    pub const fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Borrows the payload.
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Unwraps the payload.
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Splits into correlation id and payload.
    pub fn into_parts(self) -> (CorrelationId, P) {
        (self.correlation_id, self.payload)
    }

    /// Builds the response to this request, keeping its correlation id.
    pub fn reply_with<R>(&self, payload: R) -> Envelope<R> {
        Envelope::response(self.correlation_id, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_keeps_correlation_id() {
        let request = Envelope::request(CorrelationId::new(9), "balance?");
        let response = request.reply_with(120_u32);

        assert_eq!(request.kind(), EnvelopeKind::Request);
        assert_eq!(response.kind(), EnvelopeKind::Response);
        assert_eq!(response.correlation_id(), CorrelationId::new(9));
        assert_eq!(response.into_payload(), 120);
    }

    #[test]
    fn correlation_id_display() {
        assert_eq!(CorrelationId::new(42).to_string(), "#42");
    }
}
