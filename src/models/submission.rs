use std::collections::HashMap;

/// Text parts of a submission, keyed by form field name.
pub type FormFields = HashMap<String, String>;

/// The three file fields the intake form may carry, at most one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageField {
    StaffPhoto,
    CitizenFront,
    CitizenBack,
}

impl ImageField {
    pub const ALL: [ImageField; 3] = [
        ImageField::StaffPhoto,
        ImageField::CitizenFront,
        ImageField::CitizenBack,
    ];

    pub fn form_name(self) -> &'static str {
        match self {
            ImageField::StaffPhoto => "staffPhoto",
            ImageField::CitizenFront => "citizenFront",
            ImageField::CitizenBack => "citizenBack",
        }
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.form_name() == name)
    }
}

/// Where each uploaded image ended up: a relative disk path or an object-storage link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageLocations {
    pub staff_photo: Option<String>,
    pub citizen_front: Option<String>,
    pub citizen_back: Option<String>,
}

impl ImageLocations {
    pub fn set(&mut self, field: ImageField, location: String) {
        let slot = match field {
            ImageField::StaffPhoto => &mut self.staff_photo,
            ImageField::CitizenFront => &mut self.citizen_front,
            ImageField::CitizenBack => &mut self.citizen_back,
        };
        *slot = Some(location);
    }

    pub fn get(&self, field: ImageField) -> Option<&str> {
        match field {
            ImageField::StaffPhoto => self.staff_photo.as_deref(),
            ImageField::CitizenFront => self.citizen_front.as_deref(),
            ImageField::CitizenBack => self.citizen_back.as_deref(),
        }
    }
}

/// One HR intake row, ready to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubmission {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub work_type: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub member_of: Option<String>,
    pub work_place: Option<String>,
    pub unit_name: Option<String>,
    pub school_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub facebook: Option<String>,
    pub bank_account: Option<String>,
    pub bank_owner: Option<String>,
    pub bank_branch: Option<String>,
    pub citizen_id: Option<String>,
    pub permanent_address: Option<String>,
    pub current_address: Option<String>,
    pub images: ImageLocations,
    pub vehicle_plate: Option<String>,
    pub join_internal_group: Option<String>,
    pub confirm: Option<String>,
}

impl NewSubmission {
    /// Maps the intake form keys onto the record. Missing keys become `None`; the
    /// date and flag fields also treat an empty string as `None` since their
    /// columns are typed.
    pub fn from_form(form: &FormFields, images: ImageLocations) -> Self {
        let text = |key: &str| form.get(key).cloned();
        let typed = |key: &str| form.get(key).filter(|v| !v.trim().is_empty()).cloned();

        NewSubmission {
            full_name: text("fullName"),
            gender: text("gender"),
            date_of_birth: typed("dob"),
            position: text("position"),
            start_date: typed("startDate"),
            work_type: text("workType"),
            role: text("role"),
            department: text("department"),
            member_of: text("memberOf"),
            work_place: text("workPlace"),
            unit_name: text("unitName"),
            school_name: text("schoolName"),
            phone: text("phone"),
            email: text("email"),
            facebook: text("facebook"),
            bank_account: text("vpBankAccount"),
            bank_owner: text("vpBankOwner"),
            bank_branch: text("vpBankBranch"),
            citizen_id: text("citizenId"),
            permanent_address: text("permanentAddress"),
            current_address: text("currentAddress"),
            images,
            vehicle_plate: text("vehiclePlate"),
            join_internal_group: typed("joinInternalGroup"),
            confirm: text("confirm"),
        }
    }

    /// Values in insert-column order, one per `$n` placeholder.
    pub fn column_values(&self) -> [Option<&str>; 27] {
        [
            self.full_name.as_deref(),
            self.gender.as_deref(),
            self.date_of_birth.as_deref(),
            self.position.as_deref(),
            self.start_date.as_deref(),
            self.work_type.as_deref(),
            self.role.as_deref(),
            self.department.as_deref(),
            self.member_of.as_deref(),
            self.work_place.as_deref(),
            self.unit_name.as_deref(),
            self.school_name.as_deref(),
            self.phone.as_deref(),
            self.email.as_deref(),
            self.facebook.as_deref(),
            self.bank_account.as_deref(),
            self.bank_owner.as_deref(),
            self.bank_branch.as_deref(),
            self.citizen_id.as_deref(),
            self.permanent_address.as_deref(),
            self.current_address.as_deref(),
            self.images.staff_photo.as_deref(),
            self.images.citizen_front.as_deref(),
            self.images.citizen_back.as_deref(),
            self.vehicle_plate.as_deref(),
            self.join_internal_group.as_deref(),
            self.confirm.as_deref(),
        ]
    }

    /// Short label used to name the object-storage folder for this submission.
    pub fn folder_label(&self) -> String {
        let label: String = self
            .full_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        if label.trim_matches('_').is_empty() {
            "submission".to_string()
        } else {
            label
        }
    }
}
