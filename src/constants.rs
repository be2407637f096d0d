// Remote API layout: <base>/api/v1/<token>/<endpoint>
pub const API_PREFIX: &str = "api/v1";
pub const CONTACTS_ENDPOINT: &str = "buscarcontatos";
pub const CERTIFICATES_ENDPOINT: &str = "pegarcertidoesmesanocnpj";
pub const FILE_ENDPOINT: &str = "pegararquivo";
pub const FILE_ID_QUERY_PARAM: &str = "fileId";
pub const FIRST_PAGE: u32 = 1;

// Contact roster values
pub const COMPANY_CONTACT_TYPE: &str = "Empresa/Cliente";
pub const STATUS_ACTIVE: &str = "Ativo";
pub const STATUS_INACTIVE: &str = "Inativo";

// Certificate descriptor field names
pub const FILE_ID_FIELDS: &[&str] = &["Filename", "filename", "FileName"];
pub const COMPANY_FIELD: &str = "ClientContactName";
pub const OWNER_FIELD: &str = "CategoryOwnerDescription";
pub const CATEGORY_FIELD: &str = "CategoryDescription";
pub const EMISSION_DATE_FIELD: &str = "Dateemission";
pub const EXPIRATION_DATE_FIELD: &str = "Dateexpiration";

// Label fallbacks
pub const UNKNOWN_LABEL: &str = "Unknown";
pub const DEFAULT_OWNER_LABEL: &str = "Outros";
pub const DEFAULT_CATEGORY_LABEL: &str = "SemCategoria";

// Ledger timestamp format (local time)
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Environment overrides
pub const ENV_API_BASE_URL: &str = "CND_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "CND_API_TOKEN";
pub const ENV_DESTINATION_DIR: &str = "CND_DESTINATION_DIR";
