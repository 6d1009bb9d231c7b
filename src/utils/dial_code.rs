//! Country calling codes keyed by the provider's English country names.

use crate::types::DialCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Calling codes by provider country name. Several Caribbean entries use
/// the full NANP area code because that is what the app's country field
/// expects.
const PREFIX_BY_NAME: &[(&str, &str)] = &[
    ("Afghanistan", "93"),
    ("Albania", "355"),
    ("Algeria", "213"),
    ("Angola", "244"),
    ("Anguilla", "1"),
    ("Antigua and Barbuda", "1"),
    ("Argentina", "54"),
    ("Armenia", "374"),
    ("Aruba", "297"),
    ("Australia", "61"),
    ("Austria", "43"),
    ("Bahamas", "1"),
    ("Bahrain", "973"),
    ("Bangladesh", "880"),
    ("Barbados", "1"),
    ("Belgium", "32"),
    ("Belize", "501"),
    ("Benin", "229"),
    ("Bhutan", "975"),
    ("Bolivia", "591"),
    ("Bosnia", "387"),
    ("Botswana", "267"),
    ("Brazil", "55"),
    ("Bulgaria", "359"),
    ("Burkina Faso", "226"),
    ("Burundi", "257"),
    ("Cambodia", "855"),
    ("Cameroon", "237"),
    ("Canada", "1"),
    ("Cape Verde", "238"),
    ("Cayman Islands", "1"),
    ("Central African Republic", "236"),
    ("Chad", "235"),
    ("Chile", "56"),
    ("China", "86"),
    ("Colombia", "57"),
    ("Comoros", "269"),
    ("Congo", "242"),
    ("Croatia", "385"),
    ("Cuba", "53"),
    ("Cyprus", "357"),
    ("DR Congo", "243"),
    ("Dominica", "1767"),
    ("Dominican Republic", "1"),
    ("Ecuador", "593"),
    ("Egypt", "20"),
    ("Equatorial Guinea", "240"),
    ("Eritrea", "291"),
    ("Estonia", "372"),
    ("Ethiopia", "251"),
    ("France", "33"),
    ("French Guiana", "594"),
    ("Gabon", "241"),
    ("Gambia", "220"),
    ("Georgia", "995"),
    ("Germany", "49"),
    ("Grenada", "1473"),
    ("Guadeloupe", "590"),
    ("Guatemala", "502"),
    ("Guinea", "224"),
    ("Guinea-Bissau", "245"),
    ("Guyana", "592"),
    ("Honduras", "504"),
    ("Hong Kong", "852"),
    ("Iceland", "354"),
    ("India", "91"),
    ("Indonesia", "62"),
    ("Iran", "98"),
    ("Iraq", "964"),
    ("Ireland", "353"),
    ("Israel", "972"),
    ("Italy", "39"),
    ("Ivory Coast", "225"),
    ("Jamaica", "1"),
    ("Japan", "81"),
    ("Jordan", "962"),
    ("Kazakhstan", "7"),
    ("Kenya", "254"),
    ("Kosovo", "383"),
    ("Kuwait", "965"),
    ("Laos", "856"),
    ("Lebanon", "961"),
    ("Lesotho", "266"),
    ("Liberia", "231"),
    ("Libya", "218"),
    ("Lithuania", "370"),
    ("Macao", "853"),
    ("Malawi", "265"),
    ("Malaysia", "60"),
    ("Maldives", "960"),
    ("Mali", "223"),
    ("Malta", "356"),
    ("Mauritania", "222"),
    ("Mauritius", "230"),
    ("Mexico", "52"),
    ("Moldova", "373"),
    ("Mongolia", "976"),
    ("Montserrat", "1"),
    ("Morocco", "212"),
    ("Mozambique", "258"),
    ("Namibia", "264"),
    ("Netherlands", "31"),
    ("New Caledonia", "687"),
    ("New Zealand", "64"),
    ("Nicaragua", "505"),
    ("Niger", "227"),
    ("Nigeria", "234"),
    ("Niue", "683"),
    ("North Macedonia", "389"),
    ("Norway", "47"),
    ("Oman", "968"),
    ("Pakistan", "92"),
    ("Palestine", "970"),
    ("Panama", "507"),
    ("Papua New Guinea", "675"),
    ("Paraguay", "595"),
    ("Peru", "51"),
    ("Philippines", "63"),
    ("Poland", "48"),
    ("Portugal", "351"),
    ("Puerto Rico", "1"),
    ("Qatar", "974"),
    ("Reunion", "262"),
    ("Romania", "40"),
    ("Rwanda", "250"),
    ("Saint Kitts and Nevis", "1"),
    ("Saint Lucia", "1"),
    ("Saint Vincent and the Grenadines", "1"),
    ("Salvador", "503"),
    ("Sao Tome and Principe", "239"),
    ("Saudi Arabia", "966"),
    ("Serbia", "381"),
    ("Seychelles", "248"),
    ("Sierra Leone", "232"),
    ("Singapore", "65"),
    ("Slovakia", "421"),
    ("Slovenia", "386"),
    ("Somalia", "252"),
    ("South Africa", "27"),
    ("South Sudan", "211"),
    ("Spain", "34"),
    ("Sri Lanka", "94"),
    ("Sudan", "249"),
    ("Swaziland", "268"),
    ("Sweden", "46"),
    ("Switzerland", "41"),
    ("Syria", "963"),
    ("Tajikistan", "992"),
    ("Tanzania", "255"),
    ("Thailand", "66"),
    ("Timor-Leste", "670"),
    ("Togo", "228"),
    ("Trinidad and Tobago", "1"),
    ("Tunisia", "216"),
    ("Turkey", "90"),
    ("Turkmenistan", "993"),
    ("UAE", "971"),
    ("USA", "1"),
    ("Uganda", "256"),
    ("Ukraine", "380"),
    ("United Kingdom", "44"),
    ("Uruguay", "598"),
    ("Uzbekistan", "998"),
    ("Venezuela", "58"),
    ("Vietnam", "84"),
    ("Yemen", "967"),
    ("Zambia", "260"),
    ("Zimbabwe", "263"),
];

/// Name normalization for stable comparison.
/// Converts to lowercase and removes punctuation/extra whitespace.
fn norm(s: &str) -> String {
    const PUNCT: &[char] = &['\'', '"', '`', ',', '.', '-', '_', '(', ')'];
    s.to_ascii_lowercase()
        .replace(PUNCT, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

static NAME_TO_DIAL_CODE: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    PREFIX_BY_NAME
        .iter()
        .map(|(name, code)| (norm(name), *code))
        .collect()
});

/// Resolve the calling code for a provider country name.
pub(crate) fn country_name_to_dial_code(name: &str) -> Option<DialCode> {
    let code = NAME_TO_DIAL_CODE.get(&norm(name))?;
    DialCode::new(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm() {
        assert_eq!(norm("Guinea-Bissau"), "guinea bissau");
        assert_eq!(norm("  Hong   Kong "), "hong kong");
        assert_eq!(norm("Timor-Leste"), "timor leste");
    }

    #[test]
    fn test_country_name_to_dial_code() {
        let lookup = |name: &str| country_name_to_dial_code(name).map(|dc| dc.to_string());
        assert_eq!(lookup("Indonesia"), Some("62".to_string()));
        assert_eq!(lookup("USA"), Some("1".to_string()));
        assert_eq!(lookup("United Kingdom"), Some("44".to_string()));
        assert_eq!(lookup("Grenada"), Some("1473".to_string()));
    }

    #[test]
    fn test_lookup_ignores_case_and_punctuation() {
        assert_eq!(
            country_name_to_dial_code("guinea bissau").map(|dc| dc.to_string()),
            Some("245".to_string())
        );
        assert_eq!(
            country_name_to_dial_code("IVORY COAST").map(|dc| dc.to_string()),
            Some("225".to_string())
        );
    }

    #[test]
    fn test_unknown_country() {
        assert!(country_name_to_dial_code("Atlantis").is_none());
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        assert_eq!(NAME_TO_DIAL_CODE.len(), PREFIX_BY_NAME.len());
    }
}
