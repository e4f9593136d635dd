/// Report field names as they appear in submitted JSON documents.
/// The normalizer enumerates these explicitly; any other key is ignored.
pub const PROBLEM_DESCRIPTION: &str = "problemDescription";
pub const SUBMITTED_AT: &str = "submittedAt";
pub const PROBLEM_DATE: &str = "problemDate";
pub const PRODUCT_EXPIRATION_DATE: &str = "productExpirationDate";
pub const PRODUCT_NAME: &str = "productName";
pub const REPORT_IS_ABOUT: &str = "reportIsAbout";
pub const PATIENT_SEX: &str = "patientSex";
pub const PATIENT_CONDITIONS: &str = "patientKnownMedicalConditionsOrAllergies";
pub const PRODUCT_PURCHASE_LOCATION: &str = "productPurchaseLocation";
pub const SPECIFICATIONS: &str = "specifications";

/// Keys a report must carry to be accepted by the loader
pub const REQUIRED_KEYS: [&str; 2] = [PROBLEM_DESCRIPTION, SUBMITTED_AT];

/// Free-text fields: lower-cased, trimmed, missing becomes ""
pub const TEXT_FIELDS: [&str; 5] = [
    PROBLEM_DESCRIPTION,
    PATIENT_CONDITIONS,
    PRODUCT_NAME,
    PRODUCT_PURCHASE_LOCATION,
    SPECIFICATIONS,
];

/// Categorical fields: missing becomes UNKNOWN_CATEGORY
pub const CATEGORICAL_FIELDS: [&str; 2] = [REPORT_IS_ABOUT, PATIENT_SEX];

pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Date format used by the report form for problem and expiration dates
pub const REPORT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Product names that are placeholders rather than real products
pub const EXCLUDED_PRODUCT_NAMES: [&str; 3] = ["unknown", "", "n/a"];

pub const DEFAULT_REPORTS_DIR: &str = "./submitted_reports";
pub const DEFAULT_OUTPUT_FILE: &str = "report_dashboard.html";
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";
pub const DEFAULT_TOP_N: usize = 15;
pub const DEFAULT_MIN_KEYWORD_LEN: usize = 3;

/// Credential keys managed by the setup-credentials binary
pub const DEFAULT_USERNAME_KEY: &str = "DEFAULT_USERNAME";
pub const DEFAULT_PASSWORD_KEY: &str = "DEFAULT_PASSWORD";
pub const CREDENTIAL_PLACEHOLDER: &str = "<replace>";
