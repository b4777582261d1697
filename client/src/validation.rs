//! Local checks run on every request before it is sent.

use crate::error::{Result, TextSynthError};

/// A request that can check its own parameters.
pub trait Validate {
    /// Returns a [`TextSynthError::Validation`] describing the first problem found.
    fn validate(&self) -> Result<()>;
}

pub(crate) fn require_non_empty(parameter: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(TextSynthError::invalid(parameter, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn check_range<T>(parameter: &str, value: Option<T>, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if let Some(value) = value {
        if !(min <= value && value <= max) {
            return Err(TextSynthError::invalid(
                parameter,
                format!("{value} is outside [{min}, {max}]"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_min<T>(parameter: &str, value: Option<T>, min: T) -> Result<()>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if let Some(value) = value {
        if !(min <= value) {
            return Err(TextSynthError::invalid(
                parameter,
                format!("{value} is below {min}"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn check_finite(parameter: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(value) if !value.is_finite() => {
            Err(TextSynthError::invalid(parameter, "must be a finite number"))
        }
        _ => Ok(()),
    }
}

pub(crate) fn check_one_of<T>(parameter: &str, value: Option<T>, allowed: &[T]) -> Result<()>
where
    T: PartialEq + Copy + std::fmt::Debug,
{
    if let Some(value) = value {
        if !allowed.contains(&value) {
            return Err(TextSynthError::invalid(
                parameter,
                format!("{value:?} is not one of {allowed:?}"),
            ));
        }
    }
    Ok(())
}

/// Languages accepted by the `translate` endpoint.
pub const TRANSLATE_LANGUAGES: &[&str] = &[
    "ace", "ada", "adh", "ady", "af", "agr", "msm", "ahk", "sq", "alz", "abt", "am", "grc", "ar",
    "hy", "frp", "as", "av", "kwi", "awa", "quy", "ay", "az", "ban", "bm", "bci", "bas", "ba",
    "eu", "akb", "btx", "bts", "bbc", "be", "bzj", "bn", "bew", "bho", "bim", "bi", "brx", "bqc",
    "bus", "bs", "br", "ape", "bg", "bum", "my", "bua", "qvc", "jvn", "rmc", "ca", "qxr", "ceb",
    "bik", "maz", "ch", "cbk", "ce", "chr", "hne", "ny", "zh", "ctu", "cce", "cac", "chk", "cv",
    "kw", "co", "crh", "hr", "cs", "mps", "da", "dwr", "dv", "din", "tbz", "dov", "nl", "dyu",
    "dz", "bgp", "gui", "bru", "nhe", "djk", "taj", "enq", "en", "sja", "myv", "eo", "et", "ee",
    "cfm", "fo", "hif", "fj", "fil", "fi", "fip", "fon", "fr", "ff", "gag", "gl", "gbm", "cab",
    "ka", "de", "gom", "gof", "gor", "el", "guh", "gub", "gn", "amu", "ngu", "gu", "gvl", "ht",
    "cnh", "ha", "haw", "he", "hil", "mrj", "hi", "ho", "hmn", "qub", "hus", "hui", "hu", "iba",
    "ibb", "is", "ig", "ilo", "qvi", "id", "inb", "iu", "ga", "iso", "it", "ium", "izz", "jam",
    "ja", "jv", "kbd", "kbp", "kac", "dtp", "kl", "xal", "kn", "cak", "kaa", "krc", "ks", "kk",
    "meo", "kek", "ify", "kjh", "kha", "km", "kjg", "kmb", "rw", "ktu", "tlh", "trp", "kv", "koi",
    "kg", "ko", "kos", "kri", "ksd", "kj", "kum", "mkn", "ku", "ckb", "ky", "quc", "lhu", "quf",
    "laj", "lo", "ltg", "la", "lv", "ln", "lt", "lu", "lg", "lb", "ffm", "mk", "mad", "mag", "mai",
    "mak", "mgh", "mg", "ms", "ml", "mt", "mam", "mqy", "gv", "mi", "arn", "mrw", "mr", "mh",
    "mas", "msb", "mbt", "chm", "mni", "min", "lus", "mdf", "mn", "mfe", "meu", "tuc", "miq",
    "emp", "lrc", "qvz", "se", "nnb", "niq", "nv", "ne", "new", "nij", "gym", "nia", "nog", "no",
    "nut", "nyu", "nzi", "ann", "oc", "or", "oj", "ang", "om", "os", "pck", "pau", "pag", "pa",
    "pap", "ps", "fa", "pis", "pon", "pl", "jac", "pt", "qu", "otq", "raj", "rki", "rwo", "rom",
    "ro", "rm", "rn", "ru", "rcf", "alt", "quh", "qup", "msi", "hvn", "sm", "cuk", "sxn", "sg",
    "sa", "skr", "srm", "stq", "gd", "seh", "nso", "sr", "crs", "st", "shn", "shp", "sn", "jiv",
    "smt", "sd", "si", "sk", "sl", "so", "nr", "es", "srn", "acf", "su", "suz", "spp", "sus", "sw",
    "ss", "sv", "gsw", "syr", "ksw", "tab", "tg", "tks", "ber", "ta", "tdx", "tt", "tsg", "te",
    "twu", "teo", "tll", "tet", "th", "bo", "tca", "ti", "tiv", "toj", "to", "sda", "ts", "tsc",
    "tn", "tcy", "tr", "tk", "tvl", "tyv", "ak", "tzh", "tzo", "tzj", "tyz", "udm", "uk", "ppk",
    "ubu", "ur", "ug", "uz", "ve", "vec", "vi", "knj", "wa", "war", "guc", "cy", "fy", "wal", "wo",
    "noa", "xh", "sah", "yap", "yi", "yo", "yua", "zne", "zap", "dje", "zza", "zu",
];

/// Languages accepted by the `transcript` endpoint.
pub const TRANSCRIPT_LANGUAGES: &[&str] = &[
    "af", "am", "ar", "as", "az", "ba", "be", "bg", "bn", "bo", "br", "bs", "ca", "cs", "cy", "da",
    "de", "el", "en", "es", "et", "eu", "fa", "fi", "fo", "fr", "gl", "gu", "ha", "haw", "he", "hi",
    "hr", "ht", "hu", "hy", "id", "is", "it", "ja", "jw", "ka", "kk", "km", "kn", "ko", "la", "lb",
    "ln", "lo", "lt", "lv", "mg", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "ne", "nl", "nn",
    "no", "oc", "pa", "pl", "ps", "pt", "ro", "ru", "sa", "sd", "si", "sk", "sl", "sn", "so", "sq",
    "sr", "su", "sv", "sw", "ta", "te", "tg", "th", "tk", "tl", "tr", "tt", "uk", "ur", "uz", "vi",
    "yi", "yo", "yue", "zh",
];

/// Accepted as `source_lang` to let the engine detect the input language.
pub const AUTO_DETECT: &str = "auto";

pub(crate) fn check_language(parameter: &str, code: &str, allowed: &[&str]) -> Result<()> {
    require_non_empty(parameter, code)?;
    if !allowed.contains(&code) {
        return Err(TextSynthError::invalid(
            parameter,
            format!("unsupported language code '{code}'"),
        ));
    }
    Ok(())
}
