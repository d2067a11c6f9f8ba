//! Style preference form model.

use serde::{Deserialize, Serialize};

use crate::error::{StylistError, StylistResult};
use crate::image::UploadedImage;

/// Text used in prompts for any preference the user left empty.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Declares a fixed enumeration whose variants map to the literal labels
/// shown in the form and embedded in prompts.
macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $label:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every option, in form order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The literal label shown to the user.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Parse a submitted label.
            pub fn from_label(label: &str) -> StylistResult<Self> {
                match label {
                    $($label => Ok($name::$variant),)+
                    other => Err(StylistError::UnknownOption {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labeled_enum!(
    /// Fashion aesthetics the user likes.
    StyleTag, "style" {
        Casual => "Casual",
        Streetwear => "Streetwear",
        Minimalist => "Minimalist",
        Chic => "Chic",
        Glam => "Glam",
        Boho => "Boho",
        Classic => "Classic",
        Vintage => "Vintage",
        Ethnic => "Ethnic",
        TrendForward => "Trend-forward",
    }
);

labeled_enum!(
    /// Colors the user prefers wearing.
    ColorPalette, "color palette" {
        Neutrals => "Neutrals (black, white, beige)",
        Pastels => "Pastels (mint, blush)",
        Brights => "Brights (red, yellow)",
        EarthTones => "Earth tones (olive, rust)",
        JewelTones => "Jewel tones (emerald, sapphire)",
        Metallics => "Metallics (gold, silver)",
    }
);

labeled_enum!(
    /// What the user is looking for.
    FashionGoal, "fashion goal" {
        EverydayWear => "Everyday wear",
        Office => "Office/professional outfits",
        PartyOrEvent => "Party or event looks",
        Vacation => "Vacation styling",
        Seasonal => "Seasonal wardrobe ideas",
        NewAesthetic => "Try a new aesthetic",
    }
);

labeled_enum!(
    /// Feature the user wants to highlight or balance.
    FocusArea, "focus area" {
        HighlightWaist => "Highlight waist",
        AccentuateLegs => "Accentuate legs",
        SlimHips => "Slim the hips",
        AddHeight => "Add height",
        BalanceBody => "Balance upper/lower body",
        NoPreference => "No preference",
    }
);

/// Everything the preference form submits.
///
/// Only the image is required before a report can be generated; empty
/// fields are rendered as [`NOT_SPECIFIED`] in prompts.
#[derive(Debug, Clone, Default)]
pub struct StylePreferences {
    pub image: Option<UploadedImage>,
    pub styles: Vec<StyleTag>,
    pub colors: Vec<ColorPalette>,
    pub goal: Option<FashionGoal>,
    pub focus: Option<FocusArea>,
}

impl StylePreferences {
    /// Add a style, keeping form order and dropping duplicates.
    pub fn add_style(&mut self, style: StyleTag) {
        insert_sorted(&mut self.styles, style);
    }

    /// Add a color palette, keeping form order and dropping duplicates.
    pub fn add_color(&mut self, color: ColorPalette) {
        insert_sorted(&mut self.colors, color);
    }

    pub fn styles_text(&self) -> String {
        join_or_not_specified(self.styles.iter().map(|s| s.label()))
    }

    pub fn colors_text(&self) -> String {
        join_or_not_specified(self.colors.iter().map(|c| c.label()))
    }

    pub fn goal_text(&self) -> &'static str {
        self.goal.map(|g| g.label()).unwrap_or(NOT_SPECIFIED)
    }

    pub fn focus_text(&self) -> &'static str {
        self.focus.map(|f| f.label()).unwrap_or(NOT_SPECIFIED)
    }

    /// Same selections, without the image payload.
    pub fn without_image(&self) -> Self {
        Self {
            image: None,
            styles: self.styles.clone(),
            colors: self.colors.clone(),
            goal: self.goal,
            focus: self.focus,
        }
    }
}

fn insert_sorted<T: Ord>(items: &mut Vec<T>, item: T) {
    if let Err(pos) = items.binary_search(&item) {
        items.insert(pos, item);
    }
}

fn join_or_not_specified<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    let joined = labels.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_for_every_option() {
        for style in StyleTag::ALL {
            assert_eq!(StyleTag::from_label(style.label()).unwrap(), *style);
        }
        for focus in FocusArea::ALL {
            assert_eq!(FocusArea::from_label(focus.label()).unwrap(), *focus);
        }
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = ColorPalette::from_label("Neon").unwrap_err();
        assert!(matches!(err, StylistError::UnknownOption { field: "color palette", .. }));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_sets_keep_form_order_without_duplicates() {
        let mut prefs = StylePreferences::default();
        prefs.add_style(StyleTag::Vintage);
        prefs.add_style(StyleTag::Casual);
        prefs.add_style(StyleTag::Vintage);
        assert_eq!(prefs.styles, vec![StyleTag::Casual, StyleTag::Vintage]);
        assert_eq!(prefs.styles_text(), "Casual, Vintage");
    }

    #[test]
    fn test_empty_fields_read_not_specified() {
        let prefs = StylePreferences::default();
        assert_eq!(prefs.styles_text(), NOT_SPECIFIED);
        assert_eq!(prefs.colors_text(), NOT_SPECIFIED);
        assert_eq!(prefs.goal_text(), NOT_SPECIFIED);
        assert_eq!(prefs.focus_text(), NOT_SPECIFIED);
    }

    #[test]
    fn test_option_counts_match_form() {
        assert_eq!(StyleTag::ALL.len(), 10);
        assert_eq!(ColorPalette::ALL.len(), 6);
        assert_eq!(FashionGoal::ALL.len(), 6);
        assert_eq!(FocusArea::ALL.len(), 6);
    }
}
