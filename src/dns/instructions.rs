//! Tenant-facing DNS setup instructions.

use crate::config::Locale;
use crate::domain::name::record_name;
use crate::domain::{Domain, VerificationInfo};

/// Build setup instructions for `domain` pointing at `target`.
///
/// `txt` carries the ownership record name when a token exists;
/// `txt_required` decides whether the prose asks for it.
pub fn build(
    domain: &Domain,
    target: &str,
    txt: Option<(String, String)>,
    txt_required: bool,
    locale: Locale,
) -> VerificationInfo {
    let record = record_name(&domain.name);

    let mut instructions = match locale {
        Locale::En => format!(
            "Add a CNAME record to your domain's DNS:\n\nRecord name: {}\nType: CNAME\nValue: {}",
            record, target
        ),
        Locale::Ar => format!(
            "أضف سجل CNAME إلى DNS الخاص بنطاقك:\n\nاسم السجل: {}\nالنوع: CNAME\nالقيمة: {}",
            record, target
        ),
    };

    if let (Some((name, value)), true) = (&txt, txt_required) {
        let extra = match locale {
            Locale::En => format!(
                "\n\nAlso add a TXT record:\n\nRecord name: {}\nType: TXT\nValue: {}",
                name, value
            ),
            Locale::Ar => format!(
                "\n\nأضف أيضًا سجل TXT:\n\nاسم السجل: {}\nالنوع: TXT\nالقيمة: {}",
                name, value
            ),
        };
        instructions.push_str(&extra);
    }

    instructions.push_str(match locale {
        Locale::En => "\n\nVerification may take up to 24 hours.",
        Locale::Ar => "\n\nقد يستغرق التحقق حتى 24 ساعة.",
    });

    let (txt_record_name, txt_record_value) = match txt {
        Some((name, value)) => (Some(name), Some(value)),
        None => (None, None),
    };

    VerificationInfo {
        record_type: "CNAME".to_string(),
        record_name: record,
        record_value: target.to_string(),
        txt_record_name,
        txt_record_value,
        instructions,
    }
}
