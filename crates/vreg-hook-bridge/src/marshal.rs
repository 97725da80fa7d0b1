//! Result marshaling for value queries.
//!
//! Mirrors the native two-phase buffer contract: the caller declares a
//! capacity through the size destination, the bridge either fills the data
//! destination or reports the required length with `ERROR_MORE_DATA`. A
//! size-only probe (size destination present, data destination absent) is a
//! supported first phase and succeeds without copying.

use vreg_types::{NativeStatus, VirtualRegistryValue};

/// Caller-supplied output destinations for a value query.
///
/// Every field is optional; `None` models a null out-pointer at the ABI
/// edge. The `size` field is in-out: it carries the declared buffer
/// capacity in and the value's true data length out.
#[derive(Debug, Default)]
pub struct QueryValueSink<'a> {
    /// Receives the value's native type code.
    pub kind: Option<&'a mut u32>,
    /// In: declared capacity of `data`, in bytes. Out: true data length.
    pub size: Option<&'a mut u32>,
    /// Receives the data bytes; its length is the declared capacity.
    pub data: Option<&'a mut [u8]>,
}

/// Writes `value` into the sink per the native two-phase contract.
///
/// The type code is written whenever a kind destination is present,
/// independent of how the size negotiation turns out. With no size
/// destination the data phase is skipped entirely and the call succeeds;
/// passing a data destination without a size destination is an undefined
/// precondition of the native contract and intentionally not defended
/// against beyond that skip.
pub fn write_value(value: &VirtualRegistryValue, sink: QueryValueSink<'_>) -> NativeStatus {
    let QueryValueSink { kind, size, data } = sink;

    if let Some(kind_dst) = kind {
        *kind_dst = value.kind.as_raw();
    }

    let Some(size_dst) = size else {
        return NativeStatus::Success;
    };

    let length = u32::try_from(value.data.len()).unwrap_or(u32::MAX);
    if length > *size_dst {
        *size_dst = length;
        return NativeStatus::MoreData;
    }

    if let Some(data_dst) = data {
        // Guest might only need the length.
        data_dst[..value.data.len()].copy_from_slice(&value.data);
    }
    *size_dst = length;
    NativeStatus::Success
}
