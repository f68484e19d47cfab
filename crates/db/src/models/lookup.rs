//! Lookup-table enums mapping to SMALLSERIAL/SMALLINT foreign keys.
//!
//! Each variant's discriminant matches the seed-row order (1-based) in the
//! corresponding lookup table from `db/migrations/0001_initial.sql`.

/// Lookup ID type matching SMALLINT/SMALLSERIAL in the database.
pub type LookupId = i16;

macro_rules! define_lookup_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database lookup ID.
            pub fn id(self) -> LookupId {
                self as LookupId
            }

            /// Map a database lookup ID back to the enum, if known.
            pub fn from_id(id: LookupId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for LookupId {
            fn from(value: $name) -> Self {
                value as LookupId
            }
        }
    };
}

define_lookup_enum! {
    /// Declared category of an uploaded note.
    NoteType {
        LectureNotes = 1,
        ExamPrep = 2,
        CheatSheet = 3,
        Summary = 4,
        LabGuide = 5,
        CodingExamples = 6,
        PastExam = 7,
        Other = 8,
    }
}

define_lookup_enum! {
    /// Extraction pipeline state machine for a note.
    ///
    /// Created as `Pending`; a worker claim moves it to `Processing`; the
    /// outcome moves it to exactly one of `Ready` or `Failed`. Nothing
    /// outside the pipeline writes this field.
    NoteStatus {
        Pending = 1,
        Processing = 2,
        Ready = 3,
        Failed = 4,
    }
}

define_lookup_enum! {
    /// Moderation report state. Terminal once reviewed.
    ReportStatus {
        Pending = 1,
        Reviewed = 2,
        Resolved = 3,
        Dismissed = 4,
    }
}
