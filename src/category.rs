//! Transaction categories: taxonomy, display lookups and keyword classification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Icon returned for names outside the taxonomy.
pub const DEFAULT_ICON: &str = "📦";

/// Color returned for names outside the taxonomy.
pub const DEFAULT_COLOR: &str = "#8b5cf6";

/// Fixed category taxonomy. Serialized with the Portuguese labels used by
/// the issuer and the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "saúde")]
    Health,
    #[serde(rename = "supermercado")]
    Supermarket,
    #[serde(rename = "restaurante")]
    Restaurant,
    #[serde(rename = "lazer")]
    Leisure,
    #[serde(rename = "vestuário")]
    Apparel,
    #[serde(rename = "serviços")]
    Services,
    /// Catch-all.
    #[serde(rename = "outros")]
    Other,
    #[serde(rename = "viagem")]
    Travel,
    #[serde(rename = "transporte")]
    Transport,
    #[serde(rename = "educação")]
    Education,
    #[serde(rename = "moradia")]
    Housing,
    #[serde(rename = "assinatura")]
    Subscription,
}

impl Category {
    /// Every member of the taxonomy.
    pub const ALL: [Category; 12] = [
        Category::Restaurant,
        Category::Supermarket,
        Category::Health,
        Category::Leisure,
        Category::Apparel,
        Category::Services,
        Category::Other,
        Category::Travel,
        Category::Transport,
        Category::Education,
        Category::Housing,
        Category::Subscription,
    ];

    /// Portuguese label as printed on statements.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Health => "saúde",
            Category::Supermarket => "supermercado",
            Category::Restaurant => "restaurante",
            Category::Leisure => "lazer",
            Category::Apparel => "vestuário",
            Category::Services => "serviços",
            Category::Other => "outros",
            Category::Travel => "viagem",
            Category::Transport => "transporte",
            Category::Education => "educação",
            Category::Housing => "moradia",
            Category::Subscription => "assinatura",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Restaurant => "🍽️",
            Category::Supermarket => "🛒",
            Category::Health => "💊",
            Category::Leisure => "🎬",
            Category::Apparel => "👕",
            Category::Services => "✂️",
            Category::Other => DEFAULT_ICON,
            Category::Travel => "✈️",
            Category::Transport => "🚗",
            Category::Education => "📚",
            Category::Housing => "🏠",
            Category::Subscription => "📺",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Restaurant => "#f43f5e",
            Category::Supermarket => "#10b981",
            Category::Health => "#3b82f6",
            Category::Leisure => "#f59e0b",
            Category::Apparel => "#ec4899",
            Category::Services => "#06b6d4",
            Category::Other => DEFAULT_COLOR,
            Category::Travel => "#f97316",
            Category::Transport => "#6366f1",
            Category::Education => "#14b8a6",
            Category::Housing => "#eab308",
            Category::Subscription => "#a855f7",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Matches a taxonomy label, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.label() == normalized)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Icon for a category name; unknown names get [`DEFAULT_ICON`].
pub fn category_icon(name: &str) -> &'static str {
    name.parse::<Category>().map(|c| c.icon()).unwrap_or(DEFAULT_ICON)
}

/// Color for a category name; unknown names get [`DEFAULT_COLOR`].
pub fn category_color(name: &str) -> &'static str {
    name.parse::<Category>().map(|c| c.color()).unwrap_or(DEFAULT_COLOR)
}

struct Rule {
    pattern: Regex,
    category: Category,
}

fn rule(pattern: &str, category: Category) -> Rule {
    Rule {
        // Patterns are literals below; a failure here is a typo in this file.
        pattern: Regex::new(&format!("(?i){}", pattern)).expect("invalid category rule"),
        category,
    }
}

// Order is the tie-break: the first matching rule wins.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(r"farmacia|drogaria|panvel|raia|droga|saude|medic|clinic|hospital|psiq", Category::Health),
        rule(r"supermercado|bourbon|zaffari|carrefour|big\b|nacional|atacadao", Category::Supermarket),
        rule(r"market4u|market 4u", Category::Supermarket),
        rule(
            r"restaurante|cafe|bistro|pizza|burger|mcdonald|lanchon|padaria|confeitaria|fazenda|marber|quiero|amuitoprazer|lohmann|barber",
            Category::Restaurant,
        ),
        rule(
            r"cinema|cinemark|netflix|spotify|prime.*canal|paramount|teatro|show|ingresso|ipanema.*sport",
            Category::Leisure,
        ),
        rule(r"uber|99|taxi|cabify|posto|combusti|estaciona|shell|ipiranga", Category::Transport),
        rule(r"roupa|vestuario|zara|renner|cea|riachuelo|hering|alpina.*presente", Category::Apparel),
        rule(r"amazon.*prime|prime.*aluguel|melimais|assinatura", Category::Subscription),
        rule(r"amazon|mercado.*livre|shopee|aliexpress|magalu|casas.*bahia|prata.*fina", Category::Other),
        rule(r"aluguel|condominio|energia|agua|luz|ceee|corsan", Category::Housing),
        rule(r"escola|faculdade|curso|livro|udemy", Category::Education),
        rule(r"viagem|hotel|airbnb|booking|aviao|gol\b|latam|azul\b", Category::Travel),
    ]
});

/// Classify a merchant description by keyword.
///
/// Rules are evaluated in a fixed order and the first match wins; a
/// description matching nothing is [`Category::Other`].
pub fn detect_category(description: &str) -> Category {
    let desc = description.to_lowercase();
    RULES
        .iter()
        .find(|r| r.pattern.is_match(&desc))
        .map(|r| r.category)
        .unwrap_or(Category::Other)
}

/// Trust an issuer-provided category hint when it names a specific taxonomy
/// member, otherwise classify the description.
pub fn infer_category(hint: &str, description: &str) -> Category {
    match hint.parse::<Category>() {
        Ok(category) if category != Category::Other => category,
        _ => detect_category(description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookups_for_taxonomy() {
        for category in Category::ALL.into_iter().filter(|c| *c != Category::Other) {
            assert_ne!(category_icon(category.label()), DEFAULT_ICON, "{}", category);
            assert_ne!(category_color(category.label()), DEFAULT_COLOR, "{}", category);
        }
        assert_eq!(category_icon("SAÚDE"), "💊");
    }

    #[test]
    fn test_lookups_default_for_unknown() {
        assert_eq!(category_icon("pets"), DEFAULT_ICON);
        assert_eq!(category_color("pets"), DEFAULT_COLOR);
        assert_eq!(category_icon(""), DEFAULT_ICON);
        assert_eq!(category_color(""), DEFAULT_COLOR);
    }

    #[test]
    fn test_detect_category() {
        assert_eq!(detect_category("FARMACIA PANVEL"), Category::Health);
        assert_eq!(detect_category("SUPERMERCADO ZAFFARI"), Category::Supermarket);
        assert_eq!(detect_category("MARKET4U"), Category::Supermarket);
        assert_eq!(detect_category("RESTAURANTE FAZENDA"), Category::Restaurant);
        assert_eq!(detect_category("CINEMA CINEMARK"), Category::Leisure);
        assert_eq!(detect_category("POSTO IPIRANGA"), Category::Transport);
        assert_eq!(detect_category("ZARA FASHION"), Category::Apparel);
        assert_eq!(detect_category("PRIME VIDEO CANAL PREMIERE"), Category::Leisure);
        assert_eq!(detect_category("MELIMAIS"), Category::Subscription);
        assert_eq!(detect_category("MERCADO LIVRE"), Category::Other);
        assert_eq!(detect_category("CONDOMINIO ED SOL"), Category::Housing);
        assert_eq!(detect_category("UDEMY"), Category::Education);
        assert_eq!(detect_category("HOTEL IBIS"), Category::Travel);
        assert_eq!(detect_category("LOJA XPTO"), Category::Other);
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(detect_category("FARMACIA DO POSTO"), Category::Health);
        assert_eq!(detect_category("AMAZON PRIME VIDEO"), Category::Subscription);
        assert_eq!(detect_category("AMAZON MARKETPLACE"), Category::Other);
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("RESTAURANTE", "LOJA XPTO"), Category::Restaurant);
        assert_eq!(infer_category(" Vestuário ", "LOJA XPTO"), Category::Apparel);
        assert_eq!(infer_category("outros", "FARMACIA PANVEL"), Category::Health);
        assert_eq!(infer_category("", "UBER TRIP"), Category::Transport);
        assert_eq!(infer_category("SAUDE", "LOJA XPTO"), Category::Other);
    }
}
