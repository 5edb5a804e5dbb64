//! Unified, hierarchical error taxonomy for the FoxTail engine.
//!
//! Every fallible operation across Point, Card, Component, LogicChain, and
//! Chassis/Node returns a single [`Error`] value. An `Error` packs up to
//! three 8-bit "levels" into one `u32`, read outer-to-inner as
//! category -> sub-category -> leaf, e.g. `CARD:BAD_CHANNEL_ASSIGNMENTS` or
//! `COMPONENT:DIGITAL:DEMUX_INVALID_BIT_OFFSET`. [`Error::to_text`] walks
//! the tree and formats the colon-joined path; an unrecognised byte at any
//! level becomes `<unknown>`.
//!
//! This collapses what the original engine modelled as a tree of singleton
//! `ErrorCategory` objects (one per subsystem, each owning its own
//! `BETTER_ENUM`-style leaf type) into a flat `u32` plus a small dispatch
//! table walked by [`Error::to_text`]. No runtime category registration is
//! needed because the category tree is closed and known at compile time --
//! see the "static constructor ordering" redesign note in DESIGN.md.

use core::fmt;

/// Maximum length of a formatted `A:B:C` error path.
pub const MAX_TEXT_LEN: usize = 64;

const LEVEL_UNUSED: u8 = 0;

/// A single hierarchical error code.
///
/// `SUCCESS` is the all-zero value. Non-success values always have a
/// non-zero top-level category byte; higher bytes narrow the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Error(u32);

impl Error {
    pub const SUCCESS: Error = Error(0);

    const fn leaf(category: Category, leaf: u8) -> Self {
        Error(((leaf as u32) << 8) | (category as u32))
    }

    const fn sub_leaf(category: Category, sub_category: u8, leaf: u8) -> Self {
        Error(((leaf as u32) << 16) | ((sub_category as u32) << 8) | (category as u32))
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn from_raw(raw: u32) -> Self {
        Error(raw)
    }

    /// The top-level category byte (0 when `SUCCESS`).
    pub const fn category(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Walk the category tree and format a human-readable `A:B:C` path.
    /// Unknown bytes at any level become `<unknown>`.
    pub fn to_text(self) -> heapless::String<MAX_TEXT_LEN> {
        let mut out = heapless::String::new();
        if self.is_success() {
            let _ = out.push_str("SUCCESS");
            return out;
        }

        let cat_byte = self.category();
        let Some(category) = Category::from_byte(cat_byte) else {
            let _ = out.push_str("<unknown>");
            return out;
        };
        let _ = out.push_str(category.name());

        let sub_byte = ((self.0 >> 8) & 0xFF) as u8;
        if sub_byte == LEVEL_UNUSED {
            return out;
        }

        match category {
            Category::Point => append_leaf(&mut out, PointErr::from_byte(sub_byte)),
            Category::Card => append_leaf(&mut out, CardErr::from_byte(sub_byte)),
            Category::Component => append_leaf(&mut out, ComponentErr::from_byte(sub_byte)),
            Category::LogicChain => append_leaf(&mut out, LogicChainErr::from_byte(sub_byte)),
            Category::Chassis => append_leaf(&mut out, ChassisErr::from_byte(sub_byte)),
            Category::Node => append_leaf(&mut out, NodeErr::from_byte(sub_byte)),
            Category::ComponentDigital => {
                let _ = out.push_str(":DIGITAL");
                let leaf_byte = ((self.0 >> 16) & 0xFF) as u8;
                append_leaf(&mut out, DigitalErr::from_byte(leaf_byte));
            }
        }
        out
    }
}

fn append_leaf<E: LeafCode>(out: &mut heapless::String<MAX_TEXT_LEN>, leaf: Option<E>) {
    let _ = out.push(':');
    match leaf {
        Some(e) => {
            let _ = out.push_str(e.name());
        }
        None => {
            let _ = out.push_str("<unknown>");
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Top-level error categories. `ComponentDigital` nests one level under
/// `Component` to produce paths like `COMPONENT:DIGITAL:<leaf>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Category {
    Point = 1,
    Card = 2,
    Component = 3,
    LogicChain = 4,
    Chassis = 5,
    Node = 6,
    ComponentDigital = 7,
}

impl Category {
    const fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Point),
            2 => Some(Self::Card),
            3 => Some(Self::Component),
            4 => Some(Self::LogicChain),
            5 => Some(Self::Chassis),
            6 => Some(Self::Node),
            7 => Some(Self::ComponentDigital),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::Card => "CARD",
            Self::Component | Self::ComponentDigital => "COMPONENT",
            Self::LogicChain => "LOGIC_CHAIN",
            Self::Chassis => "CHASSIS",
            Self::Node => "NODE",
        }
    }
}

trait LeafCode: Sized {
    fn from_byte(b: u8) -> Option<Self>;
    fn name(&self) -> &'static str;
}

macro_rules! leaf_enum {
    ($name:ident { $($variant:ident = $val:expr => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $val),+
        }

        impl LeafCode for $name {
            fn from_byte(b: u8) -> Option<Self> {
                match b {
                    $($val => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

leaf_enum!(PointErr {
    MemoryPoint       = 1 => "MEMORY_POINT",
    UnknownGuid       = 2 => "UNKNOWN_GUID",
    MissingId         = 3 => "MISSING_ID",
    MissingTypeCfg    = 4 => "MISSING_TYPE_CFG",
    BadSetterValue    = 5 => "BAD_SETTER_VALUE",
    FailedDbInsert    = 6 => "FAILED_DB_INSERT",
    InvalidSyntax     = 7 => "INVALID_SYNTAX",
    ArrayWriteTooLong = 8 => "ARRAY_WRITE_TOO_LONG",
    UnknownEnumSymbol = 9 => "UNKNOWN_ENUM_SYMBOL",
});

impl PointErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::Point, self as u8)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

leaf_enum!(CardErr {
    MemoryCard            = 1  => "MEMORY_CARD",
    MemoryDescriptors     = 2  => "MEMORY_DESCRIPTORS",
    UnknownGuid           = 3  => "UNKNOWN_GUID",
    CardMissingId         = 4  => "CARD_MISSING_ID",
    PointMissingId        = 5  => "POINT_MISSING_ID",
    TooManyInputPoints    = 6  => "TOO_MANY_INPUT_POINTS",
    TooManyOutputPoints   = 7  => "TOO_MANY_OUTPUT_POINTS",
    BadChannelAssignments = 8  => "BAD_CHANNEL_ASSIGNMENTS",
    CardSetterError       = 9  => "CARD_SETTER_ERROR",
    CardInvalidId         = 10 => "CARD_INVALID_ID",
    AlreadyStarted        = 11 => "ALREADY_STARTED",
    NotStarted            = 12 => "NOT_STARTED",
    PointTypeMismatch     = 13 => "POINT_TYPE_MISMATCH",
});

impl CardErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::Card, self as u8)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

leaf_enum!(ComponentErr {
    UnknownGuid               = 1  => "UNKNOWN_GUID",
    TooManyInputRefs          = 2  => "TOO_MANY_INPUT_REFS",
    BadInputReference         = 3  => "BAD_INPUT_REFERENCE",
    TooManyOutputRefs         = 4  => "TOO_MANY_OUTPUT_REFS",
    BadOutputReference        = 5  => "BAD_OUTPUT_REFERENCE",
    UnresolvedInputReference  = 6  => "UNRESOLVED_INPUT_REFERENCE",
    UnresolvedOutputReference = 7  => "UNRESOLVED_OUTPUT_REFERENCE",
    OutOfMemory               = 8  => "OUT_OF_MEMORY",
    FailedStart               = 9  => "FAILED_START",
    InputReferenceBadType     = 10 => "INPUT_REFERENCE_BAD_TYPE",
    OutputReferenceBadType    = 11 => "OUTPUT_REFERENCE_BAD_TYPE",
    MismatchedInputsOutputs   = 12 => "MISMATCHED_INPUTS_OUTPUTS",
    MissingRequiredField      = 13 => "MISSING_REQUIRED_FIELD",
    IncorrectNumInputRefs     = 14 => "INCORRECT_NUM_INPUT_REFS",
    IncorrectNumOutputRefs    = 15 => "INCORRECT_NUM_OUTPUT_REFS",
    Latched                   = 16 => "LATCHED",
});

impl ComponentErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::Component, self as u8)
    }
}

// ---------------------------------------------------------------------------
// Component::Digital (nested under COMPONENT)
// ---------------------------------------------------------------------------

leaf_enum!(DigitalErr {
    DemuxInvalidBitOffset = 1 => "DEMUX_INVALID_BIT_OFFSET",
    MuxInvalidBitOffset   = 2 => "MUX_INVALID_BIT_OFFSET",
    EmptyInputSet         = 3 => "EMPTY_INPUT_SET",
});

impl DigitalErr {
    pub const fn full(self) -> Error {
        Error::sub_leaf(Category::ComponentDigital, 1, self as u8)
    }
}

// ---------------------------------------------------------------------------
// LogicChain
// ---------------------------------------------------------------------------

leaf_enum!(LogicChainErr {
    NoMemoryComponentList = 1  => "NO_MEMORY_COMPONENT_LIST",
    NoMemoryAutoPointList = 2  => "NO_MEMORY_AUTO_POINT_LIST",
    ComponentFailure      = 3  => "COMPONENT_FAILURE",
    TooManyComponents     = 4  => "TOO_MANY_COMPONENTS",
    TooManyAutoPoints     = 5  => "TOO_MANY_AUTO_POINTS",
    MissingComponents     = 6  => "MISSING_COMPONENTS",
    FailedStart           = 7  => "FAILED_START",
    ParseComponentArray   = 8  => "PARSE_COMPONENT_ARRAY",
    NoComponents          = 9  => "NO_COMPONENTS",
    FailedCreateComponent = 10 => "FAILED_CREATE_COMPONENT",
    FailedCreateAutoPoint = 11 => "FAILED_CREATE_AUTO_POINTS",
    FailedPointResolve    = 12 => "FAILED_POINT_RESOLVE",
});

impl LogicChainErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::LogicChain, self as u8)
    }
}

// ---------------------------------------------------------------------------
// Chassis
// ---------------------------------------------------------------------------

leaf_enum!(ChassisErr {
    NoMemoryCardList       = 1 => "NO_MEMORY_CARD_LIST",
    NoMemoryLogicChainList = 2 => "NO_MEMORY_LOGIC_CHAIN_LIST",
    TooManyCards           = 3 => "TOO_MANY_CARDS",
    TooManyLogicChains     = 4 => "TOO_MANY_LOGIC_CHAINS",
    FailedCreateCard       = 5 => "FAILED_CREATE_CARD",
    ChassisMissingId       = 6 => "CHASSIS_MISSING_ID",
    ShutdownTimeout        = 7 => "SHUTDOWN_TIMEOUT",
});

impl ChassisErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::Chassis, self as u8)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

leaf_enum!(NodeErr {
    NodeMissingId       = 1 => "NODE_MISSING_ID",
    NoChassis           = 2 => "NO_CHASSIS",
    TooManyChassis      = 3 => "TOO_MANY_CHASSIS",
    FailedCreateChassis = 4 => "FAILED_CREATE_CHASSIS",
    FailedPointResolve  = 5 => "FAILED_POINT_RESOLVE",
    AlreadyStarted      = 6 => "ALREADY_STARTED",
    NotStarted          = 7 => "NOT_STARTED",
    ShutdownTimeout     = 8 => "NODE_SHUTDOWN_TIMEOUT",
    ParseError          = 9 => "PARSE_ERROR",
});

impl NodeErr {
    pub const fn full(self) -> Error {
        Error::leaf(Category::Node, self as u8)
    }
}

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_all_zero() {
        assert!(Error::SUCCESS.is_success());
        assert_eq!(Error::SUCCESS.to_text(), "SUCCESS");
    }

    #[test]
    fn single_level_path() {
        let e = CardErr::BadChannelAssignments.full();
        assert_eq!(e.to_text(), "CARD:BAD_CHANNEL_ASSIGNMENTS");
    }

    #[test]
    fn nested_digital_path() {
        let e = DigitalErr::DemuxInvalidBitOffset.full();
        assert_eq!(e.to_text(), "COMPONENT:DIGITAL:DEMUX_INVALID_BIT_OFFSET");
    }

    #[test]
    fn unknown_category_byte() {
        let bogus = Error::from_raw(0xAB);
        assert_eq!(bogus.to_text(), "<unknown>");
    }

    #[test]
    fn unknown_leaf_byte() {
        let bogus = Error::from_raw((0xFFu32 << 8) | 2);
        assert_eq!(bogus.to_text(), "CARD:<unknown>");
    }
}
