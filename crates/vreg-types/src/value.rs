//! Registry value model and creation dispositions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Native registry value-type code.
///
/// Carries the numeric type codes of the real API. Codes the bridge does
/// not know about are preserved bit-exactly through [`ValueKind::Other`],
/// so a guest using a vendor-specific type code gets it back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ValueKind {
    None,
    Sz,
    ExpandSz,
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiSz,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    Other(u32),
}

impl ValueKind {
    /// Creates a ValueKind from a raw type code. Total: unknown codes map
    /// to `Other`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ValueKind::None,
            1 => ValueKind::Sz,
            2 => ValueKind::ExpandSz,
            3 => ValueKind::Binary,
            4 => ValueKind::Dword,
            5 => ValueKind::DwordBigEndian,
            6 => ValueKind::Link,
            7 => ValueKind::MultiSz,
            8 => ValueKind::ResourceList,
            9 => ValueKind::FullResourceDescriptor,
            10 => ValueKind::ResourceRequirementsList,
            11 => ValueKind::Qword,
            other => ValueKind::Other(other),
        }
    }

    /// Returns the raw native type code.
    pub fn as_raw(&self) -> u32 {
        match self {
            ValueKind::None => 0,
            ValueKind::Sz => 1,
            ValueKind::ExpandSz => 2,
            ValueKind::Binary => 3,
            ValueKind::Dword => 4,
            ValueKind::DwordBigEndian => 5,
            ValueKind::Link => 6,
            ValueKind::MultiSz => 7,
            ValueKind::ResourceList => 8,
            ValueKind::FullResourceDescriptor => 9,
            ValueKind::ResourceRequirementsList => 10,
            ValueKind::Qword => 11,
            ValueKind::Other(other) => *other,
        }
    }
}

impl From<u32> for ValueKind {
    fn from(raw: u32) -> Self {
        ValueKind::from_raw(raw)
    }
}

impl From<ValueKind> for u32 {
    fn from(kind: ValueKind) -> Self {
        kind.as_raw()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::None => write!(f, "REG_NONE"),
            ValueKind::Sz => write!(f, "REG_SZ"),
            ValueKind::ExpandSz => write!(f, "REG_EXPAND_SZ"),
            ValueKind::Binary => write!(f, "REG_BINARY"),
            ValueKind::Dword => write!(f, "REG_DWORD"),
            ValueKind::DwordBigEndian => write!(f, "REG_DWORD_BIG_ENDIAN"),
            ValueKind::Link => write!(f, "REG_LINK"),
            ValueKind::MultiSz => write!(f, "REG_MULTI_SZ"),
            ValueKind::ResourceList => write!(f, "REG_RESOURCE_LIST"),
            ValueKind::FullResourceDescriptor => write!(f, "REG_FULL_RESOURCE_DESCRIPTOR"),
            ValueKind::ResourceRequirementsList => write!(f, "REG_RESOURCE_REQUIREMENTS_LIST"),
            ValueKind::Qword => write!(f, "REG_QWORD"),
            ValueKind::Other(code) => write!(f, "REG_TYPE({})", code),
        }
    }
}

/// A single value stored under a virtual registry key.
///
/// The empty name denotes the key's default value. Value names are unique
/// within a key; the engine owns that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualRegistryValue {
    /// Value name; empty for the key's default value.
    pub name: String,
    /// Native value-type code.
    pub kind: ValueKind,
    /// Raw data payload, bit-exact as the guest supplied it.
    pub data: Vec<u8>,
}

impl VirtualRegistryValue {
    /// Creates a new value.
    pub fn new(name: impl Into<String>, kind: ValueKind, data: impl Into<Vec<u8>>) -> Self {
        VirtualRegistryValue {
            name: name.into(),
            kind,
            data: data.into(),
        }
    }

    /// Returns true if this is the key's unnamed default value.
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// Outcome tag of a create-style key operation.
///
/// The numeric values match the native disposition codes
/// (REG_CREATED_NEW_KEY / REG_OPENED_EXISTING_KEY); `NoKeyCreated` is the
/// out-of-band tag used when no key came into existence.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreationDisposition {
    NoKeyCreated = 0,
    CreatedNewKey = 1,
    OpenedExistingKey = 2,
}

impl CreationDisposition {
    /// Returns the raw native disposition code.
    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for CreationDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreationDisposition::NoKeyCreated => "NoKeyCreated",
            CreationDisposition::CreatedNewKey => "CreatedNewKey",
            CreationDisposition::OpenedExistingKey => "OpenedExistingKey",
        };
        write!(f, "{}", s)
    }
}
