//! Declarative record schemas.
//!
//! Each record type declares its fields exactly once: an identifier enum, and a
//! table row per variant holding the wire name, value kind, editor section and
//! whether that section requires it. The editor, submit-time coercion and the
//! store's validation all read these tables, so a field never exists under an
//! ad-hoc string key.

use std::fmt::Debug;
use std::hash::Hash;

use crate::records::model::RecordKind;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

pub const CANDIDATE_STATUSES: &[&str] = &[
    "NEW",
    "CONTACTED",
    "SCREENED",
    "INTERVIEWING",
    "OFFERED",
    "HIRED",
    "REJECTED",
    "WITHDRAWN",
];

pub const MANDATE_PRIORITIES: &[&str] = &["HIGH", "MEDIUM", "LOW"];

pub const MANDATE_STATUSES: &[&str] = &[
    "NEW",
    "OPEN",
    "SOURCING",
    "INTERVIEWING",
    "OFFER",
    "FILLED",
    "ON_HOLD",
    "CLOSED",
];

pub const EMPLOYMENT_TYPES: &[&str] = &["FULL_TIME", "PART_TIME", "CONTRACT"];

pub const INTERNAL_DECISIONS: &[&str] = &["PENDING", "APPROVED", "REJECTED"];

// ────────────────────────────────────────────────────────────────────────────
// Field descriptors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Date,
    Enum(&'static [&'static str]),
    /// Multi-value string field, e.g. candidate skills.
    List,
    ForeignKey(RecordKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub section: usize,
    /// Required before the editor may leave `section`.
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, section: usize, required: bool) -> FieldDef {
    FieldDef {
        name,
        kind,
        section,
        required,
    }
}

/// A record type's field identifiers.
///
/// Variants are declared in the same order as the type's `FieldDef` table, so
/// `index` doubles as the table offset.
pub trait FieldSet: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const KIND: RecordKind;
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn def(self) -> &'static FieldDef {
        &Self::KIND.fields()[self.index()]
    }

    fn name(self) -> &'static str {
        self.def().name
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    fn in_section(section: usize) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|f| f.def().section == section)
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate
// ────────────────────────────────────────────────────────────────────────────

pub const CANDIDATE_SECTIONS: &[&str] = &["Profile", "Pipeline"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateField {
    FullName,
    Email,
    Phone,
    LinkedinUrl,
    CurrentRole,
    CurrentCompany,
    Location,
    YearsOfExperience,
    KeySkills,
    Source,
    Status,
    Notes,
}

pub const CANDIDATE_FIELDS: &[FieldDef] = &[
    field("fullName", FieldKind::Text, 0, true),
    field("email", FieldKind::Text, 0, true),
    field("phone", FieldKind::Text, 0, false),
    field("linkedinUrl", FieldKind::Text, 0, false),
    field("currentRole", FieldKind::Text, 0, false),
    field("currentCompany", FieldKind::Text, 0, false),
    field("location", FieldKind::Text, 0, false),
    field("yearsOfExperience", FieldKind::Number, 0, false),
    field("keySkills", FieldKind::List, 0, false),
    field("source", FieldKind::Text, 1, false),
    field("status", FieldKind::Enum(CANDIDATE_STATUSES), 1, true),
    field("notes", FieldKind::Text, 1, false),
];

impl FieldSet for CandidateField {
    const KIND: RecordKind = RecordKind::Candidate;
    const ALL: &'static [Self] = &[
        CandidateField::FullName,
        CandidateField::Email,
        CandidateField::Phone,
        CandidateField::LinkedinUrl,
        CandidateField::CurrentRole,
        CandidateField::CurrentCompany,
        CandidateField::Location,
        CandidateField::YearsOfExperience,
        CandidateField::KeySkills,
        CandidateField::Source,
        CandidateField::Status,
        CandidateField::Notes,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

pub const CLIENT_SECTIONS: &[&str] = &["Client"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientField {
    Name,
    Industry,
    Location,
    Website,
    ContactPerson,
    ContactEmail,
    ContactPhone,
    Status,
}

pub const CLIENT_FIELDS: &[FieldDef] = &[
    field("name", FieldKind::Text, 0, true),
    field("industry", FieldKind::Text, 0, true),
    field("location", FieldKind::Text, 0, true),
    field("website", FieldKind::Text, 0, true),
    field("contactPerson", FieldKind::Text, 0, false),
    field("contactEmail", FieldKind::Text, 0, false),
    field("contactPhone", FieldKind::Text, 0, false),
    field("status", FieldKind::Text, 0, false),
];

impl FieldSet for ClientField {
    const KIND: RecordKind = RecordKind::Client;
    const ALL: &'static [Self] = &[
        ClientField::Name,
        ClientField::Industry,
        ClientField::Location,
        ClientField::Website,
        ClientField::ContactPerson,
        ClientField::ContactEmail,
        ClientField::ContactPhone,
        ClientField::Status,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Requirement (mandate)
// ────────────────────────────────────────────────────────────────────────────

pub const MANDATE_SECTIONS: &[&str] = &[
    "Requirements",
    "Role Context",
    "Compensation",
    "Timeline",
    "Candidate Persona",
    "Sourcing",
    "Qualification",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MandateField {
    Title,
    ClientId,
    Priority,
    Status,
    DateOpened,
    ReportingLines,
    Location,
    EmploymentType,
    JobDescription,
    KeyCompetencies,
    SalaryMin,
    SalaryMax,
    BonusStructure,
    EquityDetails,
    Benefits,
    FeePercentage,
    TargetSourcingSla,
    TargetOfferDate,
    TargetCloseDate,
    KeyMilestones,
    IdealProfile,
    TargetIndustries,
    ExperienceMin,
    ExperienceMax,
    Education,
    SoftSkills,
    PersonaNotes,
    SourcingChannels,
    TargetCompanies,
    Keywords,
    DoNotApproach,
    SourcingNotes,
    ClientEngagementScore,
    RoleComplexityScore,
    BrandNotes,
    PricingThresholdMet,
    InternalDecision,
    DecisionJustification,
}

pub const MANDATE_FIELDS: &[FieldDef] = &[
    // Requirements
    field("title", FieldKind::Text, 0, true),
    field("clientId", FieldKind::ForeignKey(RecordKind::Client), 0, true),
    field("priority", FieldKind::Enum(MANDATE_PRIORITIES), 0, true),
    field("status", FieldKind::Enum(MANDATE_STATUSES), 0, true),
    field("dateOpened", FieldKind::Date, 0, true),
    // Role Context
    field("reportingLines", FieldKind::Text, 1, true),
    field("location", FieldKind::Text, 1, true),
    field("employmentType", FieldKind::Enum(EMPLOYMENT_TYPES), 1, true),
    field("jobDescription", FieldKind::Text, 1, true),
    field("keyCompetencies", FieldKind::Text, 1, false),
    // Compensation
    field("salaryMin", FieldKind::Number, 2, true),
    field("salaryMax", FieldKind::Number, 2, true),
    field("bonusStructure", FieldKind::Text, 2, false),
    field("equityDetails", FieldKind::Text, 2, false),
    field("benefits", FieldKind::Text, 2, false),
    field("feePercentage", FieldKind::Number, 2, true),
    // Timeline
    field("targetSourcingSLA", FieldKind::Date, 3, true),
    field("targetOfferDate", FieldKind::Date, 3, true),
    field("targetCloseDate", FieldKind::Date, 3, true),
    field("keyMilestones", FieldKind::Text, 3, false),
    // Candidate Persona
    field("idealProfile", FieldKind::Text, 4, true),
    field("targetIndustries", FieldKind::Text, 4, false),
    field("experienceMin", FieldKind::Number, 4, true),
    field("experienceMax", FieldKind::Number, 4, true),
    field("education", FieldKind::Text, 4, false),
    field("softSkills", FieldKind::Text, 4, false),
    field("personaNotes", FieldKind::Text, 4, false),
    // Sourcing
    field("sourcingChannels", FieldKind::Text, 5, false),
    field("targetCompanies", FieldKind::Text, 5, false),
    field("keywords", FieldKind::Text, 5, false),
    field("doNotApproach", FieldKind::Text, 5, false),
    field("sourcingNotes", FieldKind::Text, 5, false),
    // Qualification
    field("clientEngagementScore", FieldKind::Number, 6, true),
    field("roleComplexityScore", FieldKind::Number, 6, true),
    field("brandNotes", FieldKind::Text, 6, false),
    field("pricingThresholdMet", FieldKind::Boolean, 6, false),
    field("internalDecision", FieldKind::Enum(INTERNAL_DECISIONS), 6, false),
    field("decisionJustification", FieldKind::Text, 6, true),
];

impl FieldSet for MandateField {
    const KIND: RecordKind = RecordKind::Mandate;
    const ALL: &'static [Self] = &[
        MandateField::Title,
        MandateField::ClientId,
        MandateField::Priority,
        MandateField::Status,
        MandateField::DateOpened,
        MandateField::ReportingLines,
        MandateField::Location,
        MandateField::EmploymentType,
        MandateField::JobDescription,
        MandateField::KeyCompetencies,
        MandateField::SalaryMin,
        MandateField::SalaryMax,
        MandateField::BonusStructure,
        MandateField::EquityDetails,
        MandateField::Benefits,
        MandateField::FeePercentage,
        MandateField::TargetSourcingSla,
        MandateField::TargetOfferDate,
        MandateField::TargetCloseDate,
        MandateField::KeyMilestones,
        MandateField::IdealProfile,
        MandateField::TargetIndustries,
        MandateField::ExperienceMin,
        MandateField::ExperienceMax,
        MandateField::Education,
        MandateField::SoftSkills,
        MandateField::PersonaNotes,
        MandateField::SourcingChannels,
        MandateField::TargetCompanies,
        MandateField::Keywords,
        MandateField::DoNotApproach,
        MandateField::SourcingNotes,
        MandateField::ClientEngagementScore,
        MandateField::RoleComplexityScore,
        MandateField::BrandNotes,
        MandateField::PricingThresholdMet,
        MandateField::InternalDecision,
        MandateField::DecisionJustification,
    ];

    fn index(self) -> usize {
        self as usize
    }
}
