use serde::Serialize;

/// Value kind a field is declared to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Flag,
    List,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Flag => "flag",
            FieldKind::List => "list",
        }
    }
}

/// Declarative per-field constraint evaluated after the kind check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldConstraint {
    Unconstrained,
    /// Inclusive numeric bounds.
    Range { min: f64, max: f64 },
    /// Inclusive character-count bounds for text.
    Length { min: usize, max: usize },
    /// Closed enumeration of accepted text values.
    OneOf(&'static [&'static str]),
    /// Text must parse as a `YYYY-MM-DD` calendar date.
    IsoDate,
    /// Text must look like an address with a local part and a domain.
    Email,
}

/// Constraint spanning more than one field of a step, or of the entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossRule {
    /// `end` must be strictly after `start` when both parse as dates.
    /// The message attaches to `end`.
    DateOrder {
        start: &'static str,
        end: &'static str,
        message: &'static str,
    },
    /// At least one of `fields` must be filled. The message attaches to
    /// the first field.
    AnyOf {
        fields: &'static [&'static str],
        message: &'static str,
    },
}

/// Static description of one form field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub constraint: FieldConstraint,
}

/// Progress category a step reports under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    Basics,
    Location,
    Financial,
    Amenities,
    Access,
    Contact,
}

impl StepCategory {
    pub const fn label(self) -> &'static str {
        match self {
            StepCategory::Basics => "Basics",
            StepCategory::Location => "Location",
            StepCategory::Financial => "Financial",
            StepCategory::Amenities => "Amenities",
            StepCategory::Access => "Access",
            StepCategory::Contact => "Contact",
        }
    }
}

/// One page of the wizard: its fields and any step-scoped cross rules.
/// Ordinal position is the index within the catalog.
#[derive(Debug, Clone)]
pub struct StepTemplate {
    pub key: &'static str,
    pub title: &'static str,
    pub category: StepCategory,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<CrossRule>,
}

impl StepTemplate {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|spec| spec.required)
    }
}

/// Fixed ordered catalog of wizard steps for a rental property record.
#[derive(Debug)]
pub struct StepCatalog {
    steps: Vec<StepTemplate>,
}

impl StepCatalog {
    pub fn standard() -> Self {
        Self {
            steps: standard_steps(),
        }
    }

    pub fn steps(&self) -> &[StepTemplate] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, key: &str) -> Option<&StepTemplate> {
        self.steps.iter().find(|step| step.key == key)
    }

    pub fn step_at(&self, index: usize) -> Option<&StepTemplate> {
        self.steps.get(index)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.key == key)
    }

    /// Locate the step owning a field, by ordinal and template. Dotted
    /// error paths resolve through their first segment.
    pub fn step_owning(&self, field: &str) -> Option<(usize, &StepTemplate)> {
        let root = field.split('.').next().unwrap_or(field);
        self.steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.field(root).is_some())
    }
}

const PROPERTY_TYPES: &[&str] = &["apartment", "house", "duplex", "condo", "townhome"];

const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH",
    "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA",
    "VT", "WA", "WI", "WV", "WY",
];

fn standard_steps() -> Vec<StepTemplate> {
    vec![
        StepTemplate {
            key: "basics",
            title: "Property Basics",
            category: StepCategory::Basics,
            fields: vec![
                FieldSpec {
                    name: "property_reference",
                    label: "Property reference",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::Length { min: 3, max: 32 },
                },
                FieldSpec {
                    name: "property_type",
                    label: "Property type",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::OneOf(PROPERTY_TYPES),
                },
                FieldSpec {
                    name: "bedrooms",
                    label: "Bedrooms",
                    kind: FieldKind::Number,
                    required: true,
                    constraint: FieldConstraint::Range { min: 0.0, max: 20.0 },
                },
                FieldSpec {
                    name: "bathrooms",
                    label: "Bathrooms",
                    kind: FieldKind::Number,
                    required: true,
                    constraint: FieldConstraint::Range { min: 0.0, max: 20.0 },
                },
                FieldSpec {
                    name: "square_feet",
                    label: "Square feet",
                    kind: FieldKind::Number,
                    required: false,
                    constraint: FieldConstraint::Range {
                        min: 120.0,
                        max: 100_000.0,
                    },
                },
                FieldSpec {
                    name: "year_built",
                    label: "Year built",
                    kind: FieldKind::Number,
                    required: false,
                    constraint: FieldConstraint::Range {
                        min: 1800.0,
                        max: 2100.0,
                    },
                },
                FieldSpec {
                    name: "summary",
                    label: "Listing summary",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 600 },
                },
            ],
            rules: Vec::new(),
        },
        StepTemplate {
            key: "location",
            title: "Location",
            category: StepCategory::Location,
            fields: vec![
                FieldSpec {
                    name: "address_line1",
                    label: "Address line 1",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::Length { min: 3, max: 120 },
                },
                FieldSpec {
                    name: "address_line2",
                    label: "Address line 2",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 120 },
                },
                FieldSpec {
                    name: "city",
                    label: "City",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::Length { min: 2, max: 80 },
                },
                FieldSpec {
                    name: "state",
                    label: "State",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::OneOf(STATE_CODES),
                },
                FieldSpec {
                    name: "postal_code",
                    label: "Postal code",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::Length { min: 5, max: 10 },
                },
            ],
            rules: Vec::new(),
        },
        StepTemplate {
            key: "financial",
            title: "Rent and Terms",
            category: StepCategory::Financial,
            fields: vec![
                FieldSpec {
                    name: "monthly_rent",
                    label: "Monthly rent",
                    kind: FieldKind::Number,
                    required: true,
                    constraint: FieldConstraint::Range {
                        min: 1.0,
                        max: 100_000.0,
                    },
                },
                FieldSpec {
                    name: "security_deposit",
                    label: "Security deposit",
                    kind: FieldKind::Number,
                    required: false,
                    constraint: FieldConstraint::Range {
                        min: 0.0,
                        max: 200_000.0,
                    },
                },
                FieldSpec {
                    name: "application_fee",
                    label: "Application fee",
                    kind: FieldKind::Number,
                    required: false,
                    constraint: FieldConstraint::Range {
                        min: 0.0,
                        max: 1_000.0,
                    },
                },
                FieldSpec {
                    name: "available_from",
                    label: "Available from",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::IsoDate,
                },
                FieldSpec {
                    name: "listing_expires",
                    label: "Listing expires",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::IsoDate,
                },
                FieldSpec {
                    name: "lease_term_months",
                    label: "Lease term (months)",
                    kind: FieldKind::Number,
                    required: false,
                    constraint: FieldConstraint::Range { min: 1.0, max: 60.0 },
                },
            ],
            rules: vec![CrossRule::DateOrder {
                start: "available_from",
                end: "listing_expires",
                message: "listing expiry must fall after the availability date",
            }],
        },
        StepTemplate {
            key: "amenities",
            title: "Amenities",
            category: StepCategory::Amenities,
            fields: vec![
                FieldSpec {
                    name: "amenities",
                    label: "Amenities",
                    kind: FieldKind::List,
                    required: false,
                    constraint: FieldConstraint::Unconstrained,
                },
                FieldSpec {
                    name: "pets_allowed",
                    label: "Pets allowed",
                    kind: FieldKind::Flag,
                    required: false,
                    constraint: FieldConstraint::Unconstrained,
                },
                FieldSpec {
                    name: "smoking_allowed",
                    label: "Smoking allowed",
                    kind: FieldKind::Flag,
                    required: false,
                    constraint: FieldConstraint::Unconstrained,
                },
                FieldSpec {
                    name: "furnished",
                    label: "Furnished",
                    kind: FieldKind::Flag,
                    required: false,
                    constraint: FieldConstraint::Unconstrained,
                },
                FieldSpec {
                    name: "accessibility_features",
                    label: "Accessibility features",
                    kind: FieldKind::List,
                    required: false,
                    constraint: FieldConstraint::Unconstrained,
                },
            ],
            rules: Vec::new(),
        },
        StepTemplate {
            key: "access",
            title: "Showing Access",
            category: StepCategory::Access,
            fields: vec![
                FieldSpec {
                    name: "lockbox_code",
                    label: "Lockbox code",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 32 },
                },
                FieldSpec {
                    name: "alarm_code",
                    label: "Alarm code",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 32 },
                },
                FieldSpec {
                    name: "gate_code",
                    label: "Gate code",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 32 },
                },
                FieldSpec {
                    name: "smart_lock_pin",
                    label: "Smart lock PIN",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 32 },
                },
                FieldSpec {
                    name: "showing_instructions",
                    label: "Showing instructions",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 0, max: 600 },
                },
            ],
            rules: Vec::new(),
        },
        StepTemplate {
            key: "contact",
            title: "Owner Contact",
            category: StepCategory::Contact,
            fields: vec![
                FieldSpec {
                    name: "owner_name",
                    label: "Owner name",
                    kind: FieldKind::Text,
                    required: true,
                    constraint: FieldConstraint::Length { min: 2, max: 120 },
                },
                FieldSpec {
                    name: "owner_phone",
                    label: "Owner phone",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Length { min: 7, max: 20 },
                },
                FieldSpec {
                    name: "owner_email",
                    label: "Owner email",
                    kind: FieldKind::Text,
                    required: false,
                    constraint: FieldConstraint::Email,
                },
            ],
            rules: Vec::new(),
        },
    ]
}
