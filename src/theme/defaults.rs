use super::ThemeValue;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

const SHADES: [&str; 11] = [
    "50", "100", "200", "300", "400", "500", "600", "700", "800", "900", "950",
];

const PALETTE: [(&str, [&str; 11]); 10] = [
    (
        "slate",
        [
            "#f8fafc", "#f1f5f9", "#e2e8f0", "#cbd5e1", "#94a3b8", "#64748b", "#475569",
            "#334155", "#1e293b", "#0f172a", "#020617",
        ],
    ),
    (
        "gray",
        [
            "#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563",
            "#374151", "#1f2937", "#111827", "#030712",
        ],
    ),
    (
        "red",
        [
            "#fef2f2", "#fee2e2", "#fecaca", "#fca5a5", "#f87171", "#ef4444", "#dc2626",
            "#b91c1c", "#991b1b", "#7f1d1d", "#450a0a",
        ],
    ),
    (
        "orange",
        [
            "#fff7ed", "#ffedd5", "#fed7aa", "#fdba74", "#fb923c", "#f97316", "#ea580c",
            "#c2410c", "#9a3412", "#7c2d12", "#431407",
        ],
    ),
    (
        "yellow",
        [
            "#fefce8", "#fef9c3", "#fef08a", "#fde047", "#facc15", "#eab308", "#ca8a04",
            "#a16207", "#854d0e", "#713f12", "#422006",
        ],
    ),
    (
        "green",
        [
            "#f0fdf4", "#dcfce7", "#bbf7d0", "#86efac", "#4ade80", "#22c55e", "#16a34a",
            "#15803d", "#166534", "#14532d", "#052e16",
        ],
    ),
    (
        "blue",
        [
            "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb",
            "#1d4ed8", "#1e40af", "#1e3a8a", "#172554",
        ],
    ),
    (
        "indigo",
        [
            "#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#4f46e5",
            "#4338ca", "#3730a3", "#312e81", "#1e1b4b",
        ],
    ),
    (
        "purple",
        [
            "#faf5ff", "#f3e8ff", "#e9d5ff", "#d8b4fe", "#c084fc", "#a855f7", "#9333ea",
            "#7e22ce", "#6b21a8", "#581c87", "#3b0764",
        ],
    ),
    (
        "pink",
        [
            "#fdf2f8", "#fce7f3", "#fbcfe8", "#f9a8d4", "#f472b6", "#ec4899", "#db2777",
            "#be185d", "#9d174d", "#831843", "#500724",
        ],
    ),
];

const SPACING_STEPS: [&str; 34] = [
    "0", "0.5", "1", "1.5", "2", "2.5", "3", "3.5", "4", "5", "6", "7", "8", "9", "10", "11",
    "12", "14", "16", "20", "24", "28", "32", "36", "40", "44", "48", "52", "56", "60", "64",
    "72", "80", "96",
];

static DEFAULT_THEME: Lazy<IndexMap<String, ThemeValue>> = Lazy::new(build_default_theme);

/// The built-in theme every context starts from.
pub fn default_theme() -> IndexMap<String, ThemeValue> {
    DEFAULT_THEME.clone()
}

fn pairs(entries: &[(&str, &str)]) -> ThemeValue {
    ThemeValue::map(
        entries
            .iter()
            .map(|(key, value)| (*key, ThemeValue::str(*value))),
    )
}

fn build_default_theme() -> IndexMap<String, ThemeValue> {
    let mut theme = IndexMap::new();

    theme.insert(
        "screens".to_string(),
        pairs(&[
            ("sm", "640px"),
            ("md", "768px"),
            ("lg", "1024px"),
            ("xl", "1280px"),
            ("2xl", "1536px"),
        ]),
    );
    theme.insert(
        "containers".to_string(),
        pairs(&[
            ("3xs", "16rem"),
            ("2xs", "18rem"),
            ("xs", "20rem"),
            ("sm", "24rem"),
            ("md", "28rem"),
            ("lg", "32rem"),
            ("xl", "36rem"),
            ("2xl", "42rem"),
            ("3xl", "48rem"),
            ("4xl", "56rem"),
            ("5xl", "64rem"),
            ("6xl", "72rem"),
            ("7xl", "80rem"),
        ]),
    );
    theme.insert("colors".to_string(), colors());
    theme.insert("spacing".to_string(), spacing());
    theme.insert(
        "opacity".to_string(),
        ThemeValue::map((0..=20).map(|step| {
            let percent = step * 5;
            (percent.to_string(), ThemeValue::str(format_ratio(percent)))
        })),
    );
    theme.insert(
        "borderRadius".to_string(),
        pairs(&[
            ("none", "0px"),
            ("sm", "0.125rem"),
            ("DEFAULT", "0.25rem"),
            ("md", "0.375rem"),
            ("lg", "0.5rem"),
            ("xl", "0.75rem"),
            ("2xl", "1rem"),
            ("3xl", "1.5rem"),
            ("full", "9999px"),
        ]),
    );
    theme.insert(
        "fontSize".to_string(),
        pairs(&[
            ("xs", "0.75rem"),
            ("sm", "0.875rem"),
            ("base", "1rem"),
            ("lg", "1.125rem"),
            ("xl", "1.25rem"),
            ("2xl", "1.5rem"),
            ("3xl", "1.875rem"),
            ("4xl", "2.25rem"),
            ("5xl", "3rem"),
        ]),
    );
    theme.insert(
        "blur".to_string(),
        pairs(&[
            ("sm", "4px"),
            ("DEFAULT", "8px"),
            ("md", "12px"),
            ("lg", "16px"),
            ("xl", "24px"),
            ("2xl", "40px"),
            ("3xl", "64px"),
        ]),
    );
    theme.insert(
        "grayscale".to_string(),
        pairs(&[("0", "0"), ("DEFAULT", "100%")]),
    );
    theme.insert(
        "rotate".to_string(),
        pairs(&[
            ("0", "0deg"),
            ("1", "1deg"),
            ("2", "2deg"),
            ("3", "3deg"),
            ("6", "6deg"),
            ("12", "12deg"),
            ("45", "45deg"),
            ("90", "90deg"),
            ("180", "180deg"),
        ]),
    );
    theme.insert(
        "scale".to_string(),
        pairs(&[
            ("0", "0"),
            ("50", ".5"),
            ("75", ".75"),
            ("90", ".9"),
            ("95", ".95"),
            ("100", "1"),
            ("105", "1.05"),
            ("110", "1.1"),
            ("125", "1.25"),
            ("150", "1.5"),
        ]),
    );
    theme.insert(
        "animation".to_string(),
        pairs(&[
            ("none", "none"),
            ("spin", "spin 1s linear infinite"),
            ("ping", "ping 1s cubic-bezier(0, 0, 0.2, 1) infinite"),
            ("pulse", "pulse 2s cubic-bezier(0.4, 0, 0.6, 1) infinite"),
            ("bounce", "bounce 1s infinite"),
        ]),
    );
    theme.insert("keyframes".to_string(), keyframes());

    for category in ["padding", "margin", "gap", "inset", "translate"] {
        theme.insert(
            category.to_string(),
            ThemeValue::function(|t| t.theme("spacing")),
        );
    }
    for (category, viewport) in [("width", "100vw"), ("height", "100vh")] {
        theme.insert(
            category.to_string(),
            ThemeValue::function(move |t| {
                let mut sizes = t.theme("spacing")?.as_map()?.clone();
                for (key, value) in [
                    ("auto", "auto"),
                    ("full", "100%"),
                    ("min", "min-content"),
                    ("max", "max-content"),
                    ("fit", "fit-content"),
                    ("screen", viewport),
                ] {
                    sizes.insert(key.to_string(), ThemeValue::str(value));
                }
                Some(ThemeValue::Map(sizes))
            }),
        );
    }

    theme
}

fn colors() -> ThemeValue {
    let mut colors = IndexMap::new();
    for (key, value) in [
        ("inherit", "inherit"),
        ("current", "currentColor"),
        ("transparent", "transparent"),
        ("black", "#000"),
        ("white", "#fff"),
    ] {
        colors.insert(key.to_string(), ThemeValue::str(value));
    }
    for (name, hexes) in PALETTE {
        colors.insert(
            name.to_string(),
            ThemeValue::map(
                SHADES
                    .iter()
                    .zip(hexes.iter())
                    .map(|(shade, hex)| (*shade, ThemeValue::str(*hex))),
            ),
        );
    }
    ThemeValue::Map(colors)
}

fn spacing() -> ThemeValue {
    let mut spacing = IndexMap::new();
    spacing.insert("px".to_string(), ThemeValue::str("1px"));
    for step in SPACING_STEPS {
        let value = if step == "0" {
            "0px".to_string()
        } else {
            let units = step.parse::<f64>().unwrap_or_default();
            format!("{}rem", trim_float(units * 0.25))
        };
        spacing.insert(step.to_string(), ThemeValue::Str(value));
    }
    ThemeValue::Map(spacing)
}

fn keyframes() -> ThemeValue {
    ThemeValue::map([
        (
            "spin",
            ThemeValue::map([("to", pairs(&[("transform", "rotate(360deg)")]))]),
        ),
        (
            "ping",
            ThemeValue::map([(
                "75%, 100%",
                pairs(&[("transform", "scale(2)"), ("opacity", "0")]),
            )]),
        ),
        (
            "pulse",
            ThemeValue::map([("50%", pairs(&[("opacity", ".5")]))]),
        ),
        (
            "bounce",
            ThemeValue::map([
                (
                    "0%, 100%",
                    pairs(&[
                        ("transform", "translateY(-25%)"),
                        ("animation-timing-function", "cubic-bezier(0.8, 0, 1, 1)"),
                    ]),
                ),
                (
                    "50%",
                    pairs(&[
                        ("transform", "none"),
                        ("animation-timing-function", "cubic-bezier(0, 0, 0.2, 1)"),
                    ]),
                ),
            ]),
        ),
    ])
}

fn format_ratio(percent: u32) -> String {
    if percent == 0 {
        return "0".to_string();
    }
    if percent == 100 {
        return "1".to_string();
    }
    trim_float(f64::from(percent) / 100.0)
}

pub(crate) fn trim_float(value: f64) -> String {
    let rendered = format!("{:.6}", value);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
