//! Macros for ergonomic state declarations.

/// Declare a fieldless enum and implement [`State`](crate::core::State) for it.
///
/// Exactly one variant must carry `#[default]`; it becomes the null state.
///
/// # Example
///
/// ```
/// use phasecraft::core::State;
/// use phasecraft::phase_enum;
///
/// phase_enum! {
///     pub enum DoorState {
///         #[default]
///         Unknown,
///         Open,
///         Closed,
///     }
/// }
///
/// assert!(DoorState::Unknown.is_null());
/// assert_eq!(DoorState::Open.name(), "Open");
/// ```
#[macro_export]
macro_rules! phase_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            Default,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    phase_enum! {
        enum TestState {
            #[default]
            None,
            Initial,
            Processing,
            Complete,
        }
    }

    #[test]
    fn phase_enum_macro_generates_trait() {
        assert_eq!(TestState::Initial.name(), "Initial");
        assert_eq!(TestState::Complete.to_string(), "Complete");
        assert!(TestState::None.is_null());
        assert!(!TestState::Processing.is_null());
    }

    #[test]
    fn phase_enum_supports_visibility() {
        phase_enum! {
            pub enum PublicState {
                #[default]
                Empty,
                A,
                B,
            }
        }

        assert_eq!(PublicState::default(), PublicState::Empty);
        assert_eq!(PublicState::B.name(), "B");
    }

    #[test]
    fn phase_enum_round_trips_names_through_serde() {
        let state: TestState = serde_json::from_str("\"Processing\"").unwrap();
        assert_eq!(state, TestState::Processing);
    }
}
