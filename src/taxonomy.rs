// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Folder taxonomies per accounting service line

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catch-all folder, present in every taxonomy
pub const CLIENT_INFORMATION: &str = "Client Information";
/// Second common folder, present in every taxonomy
pub const CORRESPONDENCE: &str = "Correspondence";

/// The service line a project belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    TaxIndividual,
    TaxBusiness,
    Audit,
    Bookkeeping,
    FinancialPlanning,
    Advisory,
    /// Anything we do not recognize
    General,
}

impl ServiceCategory {
    /// Resolve a free-text service label.
    ///
    /// Matching is by case-sensitive substring, so "Tax Return - Business" and
    /// "Business Tax" both resolve to [`ServiceCategory::TaxBusiness`]. A "Tax"
    /// label without "Business" is treated as individual.
    pub fn from_service(service: &str) -> Self {
        if service.contains("Tax") {
            if service.contains("Business") {
                Self::TaxBusiness
            } else {
                Self::TaxIndividual
            }
        } else if service.contains("Audit") {
            Self::Audit
        } else if service.contains("Bookkeeping") || service.contains("CAS") {
            Self::Bookkeeping
        } else if service.contains("Financial Planning") {
            Self::FinancialPlanning
        } else if service.contains("Advisory") {
            Self::Advisory
        } else {
            Self::General
        }
    }

    pub fn all() -> [ServiceCategory; 7] {
        [
            Self::TaxIndividual,
            Self::TaxBusiness,
            Self::Audit,
            Self::Bookkeeping,
            Self::FinancialPlanning,
            Self::Advisory,
            Self::General,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TaxIndividual => "Tax Return - Individual",
            Self::TaxBusiness => "Tax Return - Business",
            Self::Audit => "Audit",
            Self::Bookkeeping => "Bookkeeping",
            Self::FinancialPlanning => "Financial Planning",
            Self::Advisory => "Advisory",
            Self::General => "General",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Icon selector used by front ends when drawing a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderIcon {
    User,
    Mail,
    Dollar,
    Receipt,
    TrendingUp,
    FileText,
    History,
    FileSignature,
    PenTool,
    Building,
    Users,
    Truck,
    ClipboardList,
    Inbox,
    FileSearch,
    CheckCircle,
    Shield,
    BarChart,
    Landmark,
    GitMerge,
    Calculator,
    Target,
    PiggyBank,
    Umbrella,
    Scale,
    Lightbulb,
    LineChart,
    Calendar,
    Presentation,
    Folder,
}

/// A named bucket documents are grouped into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub name: &'static str,
    pub icon: FolderIcon,
}

const fn folder(name: &'static str, icon: FolderIcon) -> Folder {
    Folder { name, icon }
}

const COMMON: [Folder; 2] = [
    folder(CLIENT_INFORMATION, FolderIcon::User),
    folder(CORRESPONDENCE, FolderIcon::Mail),
];

const TAX_INDIVIDUAL: &[Folder] = &[
    folder("Income Documents", FolderIcon::Dollar),
    folder("Expense Documents", FolderIcon::Receipt),
    folder("Investment Documents", FolderIcon::TrendingUp),
    folder("Tax Returns", FolderIcon::FileText),
    folder("Prior Year Returns", FolderIcon::History),
    folder("Engagement Letters", FolderIcon::FileSignature),
    folder("Signed Forms", FolderIcon::PenTool),
];

const TAX_BUSINESS: &[Folder] = &[
    folder("Financial Statements", FolderIcon::BarChart),
    folder("Payroll Records", FolderIcon::Users),
    folder("Income Documents", FolderIcon::Dollar),
    folder("Expense Documents", FolderIcon::Receipt),
    folder("Fixed Assets", FolderIcon::Truck),
    folder("Tax Returns", FolderIcon::FileText),
    folder("Prior Year Returns", FolderIcon::History),
    folder("Engagement Letters", FolderIcon::FileSignature),
    folder("Signed Forms", FolderIcon::PenTool),
];

const AUDIT: &[Folder] = &[
    folder("Planning", FolderIcon::ClipboardList),
    folder("PBC Requests", FolderIcon::Inbox),
    folder("Workpapers", FolderIcon::FileSearch),
    folder("Confirmations", FolderIcon::CheckCircle),
    folder("Internal Controls", FolderIcon::Shield),
    folder("Financial Statements", FolderIcon::BarChart),
    folder("Management Letters", FolderIcon::FileSignature),
    folder("Reports", FolderIcon::FileText),
];

const BOOKKEEPING: &[Folder] = &[
    folder("Bank Statements", FolderIcon::Landmark),
    folder("Reconciliations", FolderIcon::GitMerge),
    folder("Invoices", FolderIcon::FileText),
    folder("Receipts", FolderIcon::Receipt),
    folder("Payroll", FolderIcon::Users),
    folder("Financial Reports", FolderIcon::BarChart),
    folder("Tax Filings", FolderIcon::Calculator),
];

const FINANCIAL_PLANNING: &[Folder] = &[
    folder("Financial Plans", FolderIcon::Target),
    folder("Investment Statements", FolderIcon::TrendingUp),
    folder("Retirement Accounts", FolderIcon::PiggyBank),
    folder("Insurance Policies", FolderIcon::Umbrella),
    folder("Estate Planning", FolderIcon::Scale),
    folder("Tax Documents", FolderIcon::Calculator),
];

const ADVISORY: &[Folder] = &[
    folder("Business Plans", FolderIcon::Lightbulb),
    folder("Financial Analysis", FolderIcon::BarChart),
    folder("Valuations", FolderIcon::Scale),
    folder("Projections", FolderIcon::LineChart),
    folder("Meeting Notes", FolderIcon::Calendar),
    folder("Deliverables", FolderIcon::Presentation),
];

const GENERAL: &[Folder] = &[
    folder("Financial Documents", FolderIcon::Dollar),
    folder("Tax Documents", FolderIcon::Calculator),
    folder("Reports", FolderIcon::FileText),
    folder("Other Documents", FolderIcon::Folder),
];

fn specific_folders(category: ServiceCategory) -> &'static [Folder] {
    match category {
        ServiceCategory::TaxIndividual => TAX_INDIVIDUAL,
        ServiceCategory::TaxBusiness => TAX_BUSINESS,
        ServiceCategory::Audit => AUDIT,
        ServiceCategory::Bookkeeping => BOOKKEEPING,
        ServiceCategory::FinancialPlanning => FINANCIAL_PLANNING,
        ServiceCategory::Advisory => ADVISORY,
        ServiceCategory::General => GENERAL,
    }
}

/// Ordered folders for a resolved service category
pub fn folders_for(category: ServiceCategory) -> Vec<Folder> {
    COMMON.iter()
        .chain(specific_folders(category))
        .cloned()
        .collect()
}

/// Ordered folders for a free-text service label
pub fn get_folders(service: &str) -> Vec<Folder> {
    folders_for(ServiceCategory::from_service(service))
}

/// Folder names only, in display order
pub fn folder_names(service: &str) -> Vec<&'static str> {
    get_folders(service).into_iter().map(|f| f.name).collect()
}

/// Whether `name` is a folder of `category`'s taxonomy
pub fn contains_folder(category: ServiceCategory, name: &str) -> bool {
    COMMON.iter()
        .chain(specific_folders(category))
        .any(|f| f.name == name)
}
