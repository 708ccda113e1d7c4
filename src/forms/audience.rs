use std::path::Path;

use serde::Deserialize;
use validator::Validate;

use crate::domain::audience::{ImportFile, NewAudienceUser};
use crate::domain::types::{CountryCode, CustomerName, PhoneNumber};
use crate::forms::FormError;

/// Upper bound for an uploaded contacts file.
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Default, Deserialize, Validate)]
/// Form data for adding a single customer.
pub struct AddCustomerForm {
    /// Customer display name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Number without the dialing code, or a full `+` prefixed number.
    #[validate(length(min = 1))]
    pub phone_number: String,
    /// Dialing code such as `+1`.
    #[validate(length(min = 1))]
    pub country_code: String,
}

impl AddCustomerForm {
    /// Validates the form and produces the payload sent to the backend.
    pub fn to_new_user(&self) -> Result<NewAudienceUser, FormError> {
        self.validate()?;

        let name = CustomerName::new(self.name.as_str()).map_err(|_| FormError::InvalidName)?;
        let country_code = CountryCode::new(self.country_code.as_str())
            .map_err(|_| FormError::InvalidCountryCode)?;
        let phone_number = PhoneNumber::new(self.phone_number.as_str(), &country_code)
            .map_err(|_| FormError::InvalidPhoneNumber)?;

        Ok(NewAudienceUser {
            phone_number,
            name,
            country_code,
        })
    }
}

/// Contacts file picked in the import dialog.
#[derive(Debug, Default)]
pub struct ImportCustomersForm {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImportCustomersForm {
    /// Reads the file at `path` into memory.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Checks size and type and produces the multipart payload.
    pub fn into_import_file(self) -> Result<ImportFile, FormError> {
        if self.bytes.is_empty() {
            return Err(FormError::EmptyFile);
        }
        if self.bytes.len() > MAX_IMPORT_BYTES {
            return Err(FormError::FileTooLarge(MAX_IMPORT_BYTES));
        }

        let extension = Path::new(&self.file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "csv" => "text/csv",
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xls" => "application/vnd.ms-excel",
            _ => return Err(FormError::UnsupportedFileType(self.file_name)),
        };

        Ok(ImportFile {
            file_name: self.file_name,
            content_type,
            bytes: self.bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, phone: &str, code: &str) -> AddCustomerForm {
        AddCustomerForm {
            name: name.to_string(),
            phone_number: phone.to_string(),
            country_code: code.to_string(),
        }
    }

    #[test]
    fn valid_form_builds_payload() {
        let user = form("Dana", "415 555 2671", "+1").to_new_user().unwrap();

        assert_eq!(user.name.as_str(), "Dana");
        assert_eq!(user.country_code.as_str(), "+1");
        assert_eq!(user.phone_number.as_str(), "415 555 2671");
    }

    #[test]
    fn empty_fields_fail_validation() {
        assert!(matches!(
            form("", "4155552671", "1").to_new_user(),
            Err(FormError::Validation(_))
        ));
        assert!(matches!(
            form("Dana", "", "1").to_new_user(),
            Err(FormError::Validation(_))
        ));
        assert!(matches!(
            form("Dana", "4155552671", "").to_new_user(),
            Err(FormError::Validation(_))
        ));
    }

    #[test]
    fn whitespace_only_name_is_rejected() {
        assert!(matches!(
            form("   ", "4155552671", "1").to_new_user(),
            Err(FormError::InvalidName)
        ));
    }

    #[test]
    fn bad_country_code_is_rejected() {
        assert!(matches!(
            form("Dana", "4155552671", "USA").to_new_user(),
            Err(FormError::InvalidCountryCode)
        ));
    }

    #[test]
    fn import_accepts_csv() {
        let file = ImportCustomersForm {
            file_name: "contacts.CSV".to_string(),
            bytes: b"name,phone_number\nDana,4155552671\n".to_vec(),
        }
        .into_import_file()
        .unwrap();

        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.file_name, "contacts.CSV");
    }

    #[test]
    fn import_rejects_empty_and_unknown_files() {
        let empty = ImportCustomersForm {
            file_name: "contacts.csv".to_string(),
            bytes: Vec::new(),
        };
        assert!(matches!(empty.into_import_file(), Err(FormError::EmptyFile)));

        let pdf = ImportCustomersForm {
            file_name: "contacts.pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(
            pdf.into_import_file(),
            Err(FormError::UnsupportedFileType(name)) if name == "contacts.pdf"
        ));
    }

    #[test]
    fn import_rejects_oversized_files() {
        let big = ImportCustomersForm {
            file_name: "contacts.csv".to_string(),
            bytes: vec![b'a'; MAX_IMPORT_BYTES + 1],
        };
        assert!(matches!(
            big.into_import_file(),
            Err(FormError::FileTooLarge(MAX_IMPORT_BYTES))
        ));
    }

    #[test]
    fn import_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "name\nDana\n").unwrap();

        let form = ImportCustomersForm::from_path(&path).unwrap();

        assert_eq!(form.file_name, "people.csv");
        assert_eq!(form.bytes, b"name\nDana\n");
    }
}
