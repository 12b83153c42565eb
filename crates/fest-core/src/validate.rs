//! Registration validation.
//!
//! The single home for every admission rule. Both the API (before
//! persistence) and the CLI (offline checks) call into this module, so no
//! rule lives in one place only. Validation collects **all** violations
//! rather than stopping at the first; any violation blocks admission.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::sport::Sport;
use crate::team::{Captain, Member, NewTeam, TeamCategory, MEMBER_SPORT_CAP};

/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 6;

/// The special characters that satisfy the password special-class rule.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A single violated admission rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {PASSWORD_MIN_LEN} characters long")]
    PasswordTooShort,
    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,
    #[error("Password must contain at least one number")]
    PasswordMissingDigit,
    #[error("Password must contain at least one special character")]
    PasswordMissingSpecial,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0}: please enter a valid Pakistani mobile number")]
    InvalidPhone(String),
    #[error("{0}: CNIC must be in the format 12345-1234567-1")]
    InvalidCnic(String),
    #[error("Please select at least one sport")]
    NoSportsSelected,
    #[error("{0}: a member may enter at most {MEMBER_SPORT_CAP} sports")]
    TooManySports(String),
    #[error("Maximum {cap} members allowed for the {category} category")]
    TooManyMembers { category: TeamCategory, cap: usize },
    #[error("{0}: duplicate CNIC — each member may appear only once")]
    DuplicateCnic(String),
}

/// Captain fields as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaptainForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cnic: String,
}

/// One member row as submitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    /// Stable row id, present when the row came from the roster editor.
    /// Fresh ids are assigned when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub phone: String,
    pub cnic: String,
    #[serde(default)]
    pub sports: Vec<Sport>,
}

/// Raw registration submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub team_name: String,
    pub institution: String,
    pub city: String,
    pub category: TeamCategory,
    pub captain: CaptainForm,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub members: Vec<MemberForm>,
    #[serde(default)]
    pub sports: Vec<Sport>,
}

/// Check an email address: one `@`, no whitespace, and a dot inside the
/// domain part with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Check a password against the length and character-class rules, returning
/// every violated rule.
pub fn validate_password(password: &str) -> Vec<RegistrationError> {
    let mut errors = Vec::new();
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(RegistrationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(RegistrationError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(RegistrationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(RegistrationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        errors.push(RegistrationError::PasswordMissingSpecial);
    }
    errors
}

/// Normalize a Pakistani mobile number to `+923XXXXXXXXX`.
///
/// Accepts `03XXXXXXXXX`, `3XXXXXXXXX`, `923XXXXXXXXX` and
/// `+923XXXXXXXXX`, with spaces and dashes ignored. Returns `None` for
/// anything else.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let local = if let Some(rest) = digits.strip_prefix("92") {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits
    };
    if local.len() == 10 && local.starts_with('3') {
        Some(format!("+92{local}"))
    } else {
        None
    }
}

/// Check a CNIC in the dashed `12345-1234567-1` format.
pub fn is_valid_cnic(cnic: &str) -> bool {
    let bytes = cnic.as_bytes();
    if bytes.len() != 15 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        5 | 13 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

fn require<'a>(value: &'a str, field: &'static str, errors: &mut Vec<RegistrationError>) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(RegistrationError::MissingField(field));
    }
    trimmed
}

/// Validate a full registration submission.
///
/// Returns the normalized team record ready for persistence, or the
/// complete list of violations. Persistence is the caller's job.
pub fn validate_registration(form: &RegistrationForm) -> Result<NewTeam, Vec<RegistrationError>> {
    let mut errors = Vec::new();

    let team_name = require(&form.team_name, "Team name", &mut errors).to_string();
    let institution = require(&form.institution, "Institution", &mut errors).to_string();
    let city = require(&form.city, "City", &mut errors).to_string();
    let captain_name = require(&form.captain.name, "Captain name", &mut errors).to_string();

    let email = form.captain.email.trim();
    if email.is_empty() {
        errors.push(RegistrationError::MissingField("Captain email"));
    } else if !is_valid_email(email) {
        errors.push(RegistrationError::InvalidEmail);
    }

    errors.extend(validate_password(&form.password));
    if form.password != form.confirm_password {
        errors.push(RegistrationError::PasswordMismatch);
    }

    let captain_phone = match normalize_phone(&form.captain.phone) {
        Some(phone) => phone,
        None => {
            errors.push(RegistrationError::InvalidPhone("Captain".to_string()));
            String::new()
        }
    };
    if !is_valid_cnic(form.captain.cnic.trim()) {
        errors.push(RegistrationError::InvalidCnic("Captain".to_string()));
    }

    let cap = form.category.member_cap();
    if form.members.len() > cap {
        errors.push(RegistrationError::TooManyMembers {
            category: form.category,
            cap,
        });
    }

    let mut members = Vec::with_capacity(form.members.len());
    let mut seen_cnics: Vec<&str> = Vec::new();
    for (index, row) in form.members.iter().enumerate() {
        let label = member_label(index, &row.name);
        let name = require(&row.name, "Member name", &mut errors).to_string();
        let phone = match normalize_phone(&row.phone) {
            Some(phone) => phone,
            None => {
                errors.push(RegistrationError::InvalidPhone(label.clone()));
                String::new()
            }
        };
        let cnic = row.cnic.trim();
        if !is_valid_cnic(cnic) {
            errors.push(RegistrationError::InvalidCnic(label.clone()));
        } else if seen_cnics.contains(&cnic) {
            errors.push(RegistrationError::DuplicateCnic(label.clone()));
        } else {
            seen_cnics.push(cnic);
        }
        if row.sports.len() > MEMBER_SPORT_CAP {
            errors.push(RegistrationError::TooManySports(label));
        }
        members.push(Member {
            id: row.id.unwrap_or_else(Uuid::new_v4),
            name,
            phone,
            cnic: cnic.to_string(),
            sports: dedup_sports(&row.sports),
        });
    }

    let sports = team_sports(&form.sports, &members);
    if sports.is_empty() {
        errors.push(RegistrationError::NoSportsSelected);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewTeam {
        team_name,
        institution,
        city,
        category: form.category,
        captain: Captain {
            name: captain_name,
            email: email.to_string(),
            phone: captain_phone,
            cnic: form.captain.cnic.trim().to_string(),
        },
        members,
        sports,
    })
}

/// Validate an edited roster against the member rules only.
///
/// Used when an existing team updates its members: the same caps and field
/// checks as registration, without the account fields.
pub fn validate_members(category: TeamCategory, members: &[Member]) -> Vec<RegistrationError> {
    let mut errors = Vec::new();
    let cap = category.member_cap();
    if members.len() > cap {
        errors.push(RegistrationError::TooManyMembers { category, cap });
    }
    let mut seen_cnics: Vec<&str> = Vec::new();
    for (index, member) in members.iter().enumerate() {
        let label = member_label(index, &member.name);
        if member.name.trim().is_empty() {
            errors.push(RegistrationError::MissingField("Member name"));
        }
        if normalize_phone(&member.phone).is_none() {
            errors.push(RegistrationError::InvalidPhone(label.clone()));
        }
        if !is_valid_cnic(&member.cnic) {
            errors.push(RegistrationError::InvalidCnic(label.clone()));
        } else if seen_cnics.contains(&member.cnic.as_str()) {
            errors.push(RegistrationError::DuplicateCnic(label.clone()));
        } else {
            seen_cnics.push(&member.cnic);
        }
        if member.sports.len() > MEMBER_SPORT_CAP {
            errors.push(RegistrationError::TooManySports(label));
        }
    }
    errors
}

/// The team's sport set: explicit selections first, then any member sports
/// not already present. Order-preserving, duplicate-free.
pub fn team_sports(selected: &[Sport], members: &[Member]) -> Vec<Sport> {
    let mut sports = dedup_sports(selected);
    for member in members {
        for sport in &member.sports {
            if !sports.contains(sport) {
                sports.push(*sport);
            }
        }
    }
    sports
}

fn dedup_sports(sports: &[Sport]) -> Vec<Sport> {
    let mut out = Vec::with_capacity(sports.len());
    for sport in sports {
        if !out.contains(sport) {
            out.push(*sport);
        }
    }
    out
}

fn member_label(index: usize, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        format!("Member {}", index + 1)
    } else {
        format!("Member {} ({name})", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base_form() -> RegistrationForm {
        RegistrationForm {
            team_name: "Falcons".to_string(),
            institution: "Model College".to_string(),
            city: "Lahore".to_string(),
            category: TeamCategory::University,
            captain: CaptainForm {
                name: "Ayesha Khan".to_string(),
                email: "ayesha@example.com".to_string(),
                phone: "03001234567".to_string(),
                cnic: "35202-1234567-8".to_string(),
            },
            password: "Abc123!".to_string(),
            confirm_password: "Abc123!".to_string(),
            members: vec![],
            sports: vec![Sport::Cricket],
        }
    }

    fn member_form(n: usize) -> MemberForm {
        MemberForm {
            id: None,
            name: format!("Member {n}"),
            phone: "03001234567".to_string(),
            cnic: format!("35202-{:07}-1", n),
            sports: vec![],
        }
    }

    #[test]
    fn email_rules() {
        assert!(!is_valid_email("a@b"));
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a@.b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("abc.com"));
    }

    #[test]
    fn password_missing_classes_reported_exactly() {
        let errors = validate_password("abc123");
        assert_eq!(
            errors,
            vec![
                RegistrationError::PasswordMissingUppercase,
                RegistrationError::PasswordMissingSpecial,
            ]
        );
        assert!(validate_password("Abc123!").is_empty());
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(
            normalize_phone("03001234567").as_deref(),
            Some("+923001234567")
        );
        assert_eq!(
            normalize_phone("3001234567").as_deref(),
            Some("+923001234567")
        );
        assert_eq!(
            normalize_phone("923001234567").as_deref(),
            Some("+923001234567")
        );
        assert_eq!(
            normalize_phone("+92 300 123-4567").as_deref(),
            Some("+923001234567")
        );
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("0400123456"), None);
    }

    #[test]
    fn cnic_rules() {
        assert!(is_valid_cnic("35202-1234567-8"));
        assert!(!is_valid_cnic("352021234567"));
        assert!(!is_valid_cnic("35202-1234567-88"));
        assert!(!is_valid_cnic("3520a-1234567-8"));
    }

    #[test]
    fn accepts_a_minimal_valid_form() {
        let team = validate_registration(&base_form()).expect("form should pass");
        assert_eq!(team.captain.phone, "+923001234567");
        assert_eq!(team.sports, vec![Sport::Cricket]);
        assert_eq!(team.participant_count(), 1);
    }

    #[test]
    fn collects_all_violations() {
        let mut form = base_form();
        form.team_name = "  ".to_string();
        form.captain.email = "a@b".to_string();
        form.captain.phone = "12345".to_string();
        form.sports.clear();
        let errors = validate_registration(&form).unwrap_err();
        assert!(errors.contains(&RegistrationError::MissingField("Team name")));
        assert!(errors.contains(&RegistrationError::InvalidEmail));
        assert!(errors.contains(&RegistrationError::InvalidPhone("Captain".to_string())));
        assert!(errors.contains(&RegistrationError::NoSportsSelected));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn member_with_four_sports_rejected_three_accepted() {
        let mut form = base_form();
        let mut row = member_form(1);
        row.sports = vec![Sport::Cricket, Sport::Futsal, Sport::Chess, Sport::Ludo];
        form.members.push(row);
        let errors = validate_registration(&form).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, RegistrationError::TooManySports(_))));

        form.members[0].sports.pop();
        assert!(validate_registration(&form).is_ok());
    }

    #[test]
    fn member_cap_enforced_per_category() {
        let mut form = base_form();
        form.members = (0..16).map(member_form).collect();
        let errors = validate_registration(&form).unwrap_err();
        assert!(errors.contains(&RegistrationError::TooManyMembers {
            category: TeamCategory::University,
            cap: 15,
        }));

        form.members.pop();
        assert!(validate_registration(&form).is_ok());
    }

    #[test]
    fn zero_sports_rejected() {
        let mut form = base_form();
        form.sports.clear();
        let errors = validate_registration(&form).unwrap_err();
        assert_eq!(errors, vec![RegistrationError::NoSportsSelected]);
    }

    #[test]
    fn member_sports_count_toward_team_selection() {
        let mut form = base_form();
        form.sports.clear();
        let mut row = member_form(1);
        row.sports = vec![Sport::Badminton];
        form.members.push(row);
        let team = validate_registration(&form).expect("member sport satisfies the rule");
        assert_eq!(team.sports, vec![Sport::Badminton]);
    }

    #[test]
    fn duplicate_member_cnic_rejected() {
        let mut form = base_form();
        let mut a = member_form(1);
        let mut b = member_form(2);
        b.cnic = a.cnic.clone();
        a.sports = vec![Sport::Chess];
        form.members.push(a);
        form.members.push(b);
        let errors = validate_registration(&form).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, RegistrationError::DuplicateCnic(_))));
    }

    #[test]
    fn password_mismatch_rejected() {
        let mut form = base_form();
        form.confirm_password = "Abc123!!".to_string();
        let errors = validate_registration(&form).unwrap_err();
        assert_eq!(errors, vec![RegistrationError::PasswordMismatch]);
    }

    proptest! {
        #[test]
        fn normalized_phones_are_canonical(rest in proptest::collection::vec(0u8..10, 9), prefix in 0usize..4) {
            let digits: String = rest.iter().map(|d| char::from(b'0' + d)).collect();
            let local = format!("3{digits}");
            let input = match prefix {
                0 => local.clone(),
                1 => format!("0{local}"),
                2 => format!("92{local}"),
                _ => format!("+92{local}"),
            };
            let normalized = normalize_phone(&input).expect("all four shapes are valid");
            prop_assert_eq!(&normalized, &format!("+92{}", local));
            prop_assert_eq!(normalized.len(), 13);
        }

        #[test]
        fn validator_never_admits_oversubscribed_members(counts in proptest::collection::vec(0usize..6, 1..5)) {
            let mut form = base_form();
            for (i, n) in counts.iter().enumerate() {
                let mut row = member_form(i + 1);
                row.sports = Sport::ALL[..*n].to_vec();
                form.members.push(row);
            }
            if let Ok(team) = validate_registration(&form) {
                prop_assert!(team.members.iter().all(|m| m.sports.len() <= MEMBER_SPORT_CAP));
            } else {
                prop_assert!(counts.iter().any(|n| *n > MEMBER_SPORT_CAP));
            }
        }
    }
}
