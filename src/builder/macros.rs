//! Macros for declaring state sets.

/// Declare a state enum and generate its [`State`](crate::core::State)
/// implementation.
///
/// Each variant maps to a `(id, label)` pair. The optional `alarm:` list
/// marks the variants that represent an alarm condition. The macro also
/// generates `ALL` (every variant, in declaration order) and
/// `descriptors()`.
///
/// # Example
///
/// ```
/// use alarmline::core::State;
/// use alarmline::state_enum;
///
/// state_enum! {
///     pub enum TamperState {
///         Sealed => ("sealed", "Sealed"),
///         Opened => ("opened", "Enclosure opened"),
///     }
///     alarm: [Opened]
/// }
///
/// assert_eq!(TamperState::ALL.len(), 2);
/// assert_eq!(TamperState::Opened.label(), "Enclosure opened");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => ($id:literal, $label:literal)
            ),* $(,)?
        }

        $(alarm: [$($alarm:ident),* $(,)?])?
    ) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every state, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Display descriptors for every state, in declaration order.
            pub fn descriptors() -> ::std::vec::Vec<$crate::core::StateDescriptor> {
                Self::ALL
                    .iter()
                    .map(|state| $crate::core::State::descriptor(state))
                    .collect()
            }
        }

        impl $crate::core::State for $name {
            fn id(&self) -> $crate::core::StateId {
                match self {
                    $(Self::$variant => $id),*
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_alarm(&self) -> bool {
                match self {
                    $($(Self::$alarm => true,)*)?
                    _ => false,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::State::id(self))
            }
        }
    };
}
