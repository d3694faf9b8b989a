use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::MaskKind;
use crate::fields::FieldKind;

const REDACTED_MARKER: &str = "[REDACTED]";
const FIXED_MASK_LEN: usize = 3;

/// Options controlling partial masking output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Leading characters the generic strategy keeps visible.
    pub partial_show_length: usize,
    /// Character substituted for masked content.
    pub mask_char: char,
    /// Keeps the domain readable when partially masking email addresses.
    pub email_domain_visible: bool,
    /// Keeps a detected country code readable when partially masking phone numbers.
    pub phone_country_visible: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            partial_show_length: 4,
            mask_char: '*',
            email_domain_visible: true,
            phone_country_visible: true,
        }
    }
}

impl MaskingConfig {
    fn mask_run(&self, length: usize) -> String {
        std::iter::repeat_n(self.mask_char, length).collect()
    }
}

/// Applies a display mask to an optional raw value.
///
/// A missing value always masks to the empty string, for every mask kind.
/// [`MaskKind::None`] returns the value unchanged. [`MaskKind::Partial`]
/// dispatches on the field kind and falls back to the generic strategy.
/// [`MaskKind::Encrypted`] emits a deterministic checksum placeholder, not
/// ciphertext.
#[must_use]
pub fn apply_mask(
    value: Option<&str>,
    mask: MaskKind,
    field_kind: FieldKind,
    config: &MaskingConfig,
) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match mask {
        MaskKind::None => value.to_owned(),
        MaskKind::Partial => apply_partial(value, field_kind, config),
        MaskKind::Encrypted => encrypted_placeholder(value),
        MaskKind::Redacted => REDACTED_MARKER.to_owned(),
        MaskKind::Hidden => config.mask_run(value.chars().count()),
    }
}

/// Returns whether a mask kind calls for omitting the field entirely
/// instead of rendering a placeholder.
#[must_use]
pub fn should_hide_field(mask: MaskKind) -> bool {
    matches!(mask, MaskKind::Hidden | MaskKind::Redacted)
}

fn apply_partial(value: &str, field_kind: FieldKind, config: &MaskingConfig) -> String {
    match field_kind {
        FieldKind::Email => partial_email(value, config),
        FieldKind::Phone => partial_phone(value, config),
        FieldKind::CreditCard => partial_credit_card(value, config),
        FieldKind::Ssn => partial_ssn(value, config),
        FieldKind::Address => partial_address(value, config),
        FieldKind::Name => partial_name(value, config),
        FieldKind::Amount => partial_amount(value, config),
        FieldKind::Generic => partial_generic(value, config),
    }
}

fn encrypted_placeholder(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let checksum: String = digest
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect();

    format!("[ENCRYPTED:{checksum}]")
}

fn partial_email(value: &str, config: &MaskingConfig) -> String {
    let Some((local, domain)) = value.split_once('@') else {
        return partial_generic(value, config);
    };

    let masked_local = match local.chars().next() {
        Some(first) if local.chars().count() > 1 => {
            format!("{first}{}", config.mask_run(FIXED_MASK_LEN))
        }
        _ => config.mask_run(1),
    };

    if config.email_domain_visible {
        format!("{masked_local}@{domain}")
    } else {
        format!("{masked_local}@{}", config.mask_run(domain.chars().count()))
    }
}

fn partial_phone(value: &str, config: &MaskingConfig) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < 4 {
        return config.mask_run(value.chars().count());
    }

    let last_four = &digits[digits.len() - 4..];

    // The country code is whatever precedes the last ten digits.
    if config.phone_country_visible && value.starts_with('+') && digits.len() > 10 {
        let country_code = &digits[..digits.len() - 10];
        let masked = config.mask_run(digits.len() - country_code.len() - 4);
        return format!("{country_code}-{masked}-{last_four}");
    }

    format!("{}{last_four}", config.mask_run(digits.len() - 4))
}

fn partial_credit_card(value: &str, config: &MaskingConfig) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < 4 {
        return config.mask_run(value.chars().count());
    }

    let last_four = &digits[digits.len() - 4..];

    if value.contains('-') {
        let groups = (digits.len() - 4).div_ceil(4);
        let mut parts = vec![config.mask_run(4); groups];
        parts.push(last_four.to_owned());
        return parts.join("-");
    }

    format!("{}{last_four}", config.mask_run(digits.len() - 4))
}

fn partial_ssn(value: &str, config: &MaskingConfig) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.len() != 9 {
        return config.mask_run(value.chars().count());
    }

    let last_four = &digits[5..];
    format!("{}-{}-{last_four}", config.mask_run(3), config.mask_run(2))
}

fn partial_address(value: &str, config: &MaskingConfig) -> String {
    let masked_digits = mask_digit_runs(value, config);

    let mut words: Vec<String> = masked_digits
        .split_whitespace()
        .map(str::to_owned)
        .collect();

    let mut index = 0;
    while index < words.len() {
        if is_unit_designator(&words[index]) && index + 1 < words.len() {
            words[index + 1] = config.mask_run(FIXED_MASK_LEN);
            index += 2;
            continue;
        }
        index += 1;
    }

    words.join(" ")
}

fn mask_digit_runs(value: &str, config: &MaskingConfig) -> String {
    let mut output = String::with_capacity(value.len());
    let mut in_digit_run = false;

    for ch in value.chars() {
        if ch.is_ascii_digit() {
            if !in_digit_run {
                output.push_str(&config.mask_run(FIXED_MASK_LEN));
                in_digit_run = true;
            }
        } else {
            in_digit_run = false;
            output.push(ch);
        }
    }

    output
}

fn is_unit_designator(word: &str) -> bool {
    const DESIGNATORS: &[&str] = &["apt", "apartment", "unit", "suite", "ste"];

    let normalized = word.trim_end_matches('.').to_ascii_lowercase();
    DESIGNATORS.contains(&normalized.as_str())
}

fn partial_name(value: &str, config: &MaskingConfig) -> String {
    value
        .split_whitespace()
        .map(|word| match word.chars().next() {
            Some(first) if word.chars().count() > 1 => {
                format!("{first}{}", config.mask_run(word.chars().count() - 1))
            }
            _ => word.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn partial_amount(value: &str, config: &MaskingConfig) -> String {
    let Some(digit_start) = value.find(|ch: char| ch.is_ascii_digit()) else {
        return partial_generic(value, config);
    };

    let (prefix, rest) = value.split_at(digit_start);
    let (body, decimals) = split_decimal_suffix(rest);

    let masked_body: String = body
        .chars()
        .map(|ch| {
            if ch.is_ascii_digit() {
                config.mask_char
            } else {
                ch
            }
        })
        .collect();

    format!("{prefix}{masked_body}{decimals}")
}

fn split_decimal_suffix(value: &str) -> (&str, &str) {
    if let Some(dot) = value.rfind('.') {
        let fraction = &value[dot + 1..];
        if !fraction.is_empty()
            && fraction.len() <= 2
            && fraction.chars().all(|ch| ch.is_ascii_digit())
        {
            return (&value[..dot], &value[dot..]);
        }
    }

    (value, "")
}

fn partial_generic(value: &str, config: &MaskingConfig) -> String {
    let length = value.chars().count();
    if length <= config.partial_show_length {
        return config.mask_run(length);
    }

    let visible: String = value.chars().take(config.partial_show_length).collect();
    format!(
        "{visible}{}",
        config.mask_run(length - config.partial_show_length)
    )
}
