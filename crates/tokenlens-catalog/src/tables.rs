//! Built-in provider tables
//!
//! Every supported provider is listed here explicitly. Adding a provider means
//! adding its table file and one line below.

pub(crate) const BUILTIN_TABLES: &[(&str, &str)] = &[
    ("openai", include_str!("../tables/openai.toml")),
    ("anthropic", include_str!("../tables/anthropic.toml")),
    ("google", include_str!("../tables/google.toml")),
    ("huggingface", include_str!("../tables/huggingface.toml")),
    ("meta", include_str!("../tables/meta.toml")),
    ("mistral", include_str!("../tables/mistral.toml")),
    ("cohere", include_str!("../tables/cohere.toml")),
    ("ai21", include_str!("../tables/ai21.toml")),
    ("qwen", include_str!("../tables/qwen.toml")),
    ("stanford", include_str!("../tables/stanford.toml")),
    ("deepmind", include_str!("../tables/deepmind.toml")),
    ("microsoft", include_str!("../tables/microsoft.toml")),
    ("amazon", include_str!("../tables/amazon.toml")),
    ("stability", include_str!("../tables/stability.toml")),
    ("midjourney", include_str!("../tables/midjourney.toml")),
    ("adobe", include_str!("../tables/adobe.toml")),
    ("ideogram", include_str!("../tables/ideogram.toml")),
    ("runway", include_str!("../tables/runway.toml")),
    ("nightcafe", include_str!("../tables/nightcafe.toml")),
    ("openart", include_str!("../tables/openart.toml")),
    ("realm", include_str!("../tables/realm.toml")),
    ("starrytars", include_str!("../tables/starrytars.toml")),
    ("synthesia", include_str!("../tables/synthesia.toml")),
    ("d-id", include_str!("../tables/d-id.toml")),
    ("replika", include_str!("../tables/replika.toml")),
    ("haygen", include_str!("../tables/haygen.toml")),
    ("fugatto", include_str!("../tables/fugatto.toml")),
];

/// Names of the providers compiled into the crate, in declaration order
pub fn builtin_provider_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_TABLES.iter().map(|(name, _)| *name)
}
