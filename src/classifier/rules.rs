// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ordered pattern tables, one per service line.
//!
//! Patterns run against lower-cased `doc_type` and `original_name`. Within a
//! table, more specific patterns come before broad ones: first match wins.
//!
//! File names use `_`, `-` and `.` as separators, which `\b` treats as word
//! characters, so tables mark edges with their own tokens instead:
//! `~` is a word edge (anything but a letter or digit, or either end of the
//! text) and `#` is a number edge (anything but a digit, or either end).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::taxonomy::{ServiceCategory, CORRESPONDENCE};

/// A compiled `(pattern, folder)` pair
#[derive(Debug)]
pub struct Rule {
    pub pattern: Regex,
    pub folder: &'static str,
}

const WORD_EDGE: &str = r"(?:^|$|[^a-z0-9])";
const NUMBER_EDGE: &str = r"(?:^|$|[^0-9])";

const CORRESPONDENCE_PATTERN: &str = r"letter|~e-?mail|correspondence|~notices?~";

const TAX_INDIVIDUAL: &[(&str, &str)] = &[
    (r"engagement[\s_-]*letter", "Engagement Letters"),
    (r"#8879#|~signed~|signature", "Signed Forms"),
    (r"prior[\s_-]*year", "Prior Year Returns"),
    (r"#1040#|tax[\s_-]*return", "Tax Returns"),
    (r"#1098#|mortgage|property[\s_-]*tax|~charit|donation|medical|tuition|daycare|child[\s_-]*care|receipt", "Expense Documents"),
    (r"#1099-?b~|#1099-?div|brokerage|investment|capital[\s_-]*gains?|~stocks?~", "Investment Documents"),
    (r"~w-?2~|#1099#|~k-?1~|pay[\s_-]*stub|~wages?~|salary|income|social[\s_-]*security", "Income Documents"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

const TAX_BUSINESS: &[(&str, &str)] = &[
    (r"engagement[\s_-]*letter", "Engagement Letters"),
    (r"#8879#|~signed~|signature", "Signed Forms"),
    (r"prior[\s_-]*year", "Prior Year Returns"),
    (r"#1120s?~|#1065#|#1040#|tax[\s_-]*return|schedule[\s_-]*c~", "Tax Returns"),
    (r"payroll|#94[01]#|~w-?[23]~|timesheet", "Payroll Records"),
    (r"balance[\s_-]*sheet|~profit|~p&l~|income[\s_-]*statement|trial[\s_-]*balance|general[\s_-]*ledger|financial[\s_-]*statement", "Financial Statements"),
    (r"depreciation|fixed[\s_-]*asset|equipment|vehicle|#4562#", "Fixed Assets"),
    (r"#1099#|~sales~|revenue|invoice|income", "Income Documents"),
    (r"expense|receipt|~bills?~|~rent~|~utilit|#1098#", "Expense Documents"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

const AUDIT: &[(&str, &str)] = &[
    (r"engagement[\s_-]*letter|planning|risk[\s_-]*assessment|materiality", "Planning"),
    (r"~pbc~|provided[\s_-]*by[\s_-]*client|request[\s_-]*list", "PBC Requests"),
    (r"work[\s_-]*papers?|lead[\s_-]*schedule|tickmark", "Workpapers"),
    (r"confirmation", "Confirmations"),
    (r"internal[\s_-]*control|walkthrough|~soc[\s_-]*[12]~", "Internal Controls"),
    (r"management[\s_-]*letter|representation[\s_-]*letter", "Management Letters"),
    (r"trial[\s_-]*balance|balance[\s_-]*sheet|financial[\s_-]*statement|general[\s_-]*ledger|income[\s_-]*statement", "Financial Statements"),
    (r"~report|~opinion", "Reports"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

const BOOKKEEPING: &[(&str, &str)] = &[
    (r"reconcil", "Reconciliations"),
    (r"~bank|credit[\s_-]*card[\s_-]*statement", "Bank Statements"),
    (r"payroll|pay[\s_-]*stub|timesheet", "Payroll"),
    (r"invoice|~bills?~|accounts[\s_-]*(payable|receivable)", "Invoices"),
    (r"receipt|expense", "Receipts"),
    (r"~profit|~p&l~|balance[\s_-]*sheet|financial[\s_-]*report|income[\s_-]*statement|cash[\s_-]*flow", "Financial Reports"),
    (r"sales[\s_-]*tax|#1099#|#94[01]#|~tax", "Tax Filings"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

const FINANCIAL_PLANNING: &[(&str, &str)] = &[
    (r"~estate~|~wills?~|~trusts?~|power[\s_-]*of[\s_-]*attorney|beneficiar", "Estate Planning"),
    (r"#401\(?k\)?|#403\(?b\)?|~ira~|~roth~|pension|retirement", "Retirement Accounts"),
    (r"insurance|~polic(y|ies)~|annuit", "Insurance Policies"),
    (r"brokerage|investment|portfolio|statement", "Investment Statements"),
    (r"financial[\s_-]*plan|projection|budget|~goals?~|cash[\s_-]*flow", "Financial Plans"),
    (r"~tax|#1040#|~w-?2~|#1099#", "Tax Documents"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

const ADVISORY: &[(&str, &str)] = &[
    (r"valuation|appraisal", "Valuations"),
    (r"forecast|projection|budget", "Projections"),
    (r"business[\s_-]*plan|strategy|strategic", "Business Plans"),
    (r"analysis|~kpis?~|benchmark|~ratios?~|financial[\s_-]*statement", "Financial Analysis"),
    (r"meeting|~minutes~|~notes~|agenda", "Meeting Notes"),
    (r"~report|deliverable|presentation|~decks?~", "Deliverables"),
    (CORRESPONDENCE_PATTERN, CORRESPONDENCE),
];

fn compile(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table.iter()
        .map(|&(pattern, folder)| Rule {
            pattern: Regex::new(&expand_edges(pattern))
                .expect("built-in classification pattern must compile"),
            folder,
        })
        .collect()
}

fn expand_edges(pattern: &str) -> String {
    pattern.replace('~', WORD_EDGE).replace('#', NUMBER_EDGE)
}

static TAX_INDIVIDUAL_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(TAX_INDIVIDUAL));
static TAX_BUSINESS_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(TAX_BUSINESS));
static AUDIT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(AUDIT));
static BOOKKEEPING_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(BOOKKEEPING));
static FINANCIAL_PLANNING_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(FINANCIAL_PLANNING));
static ADVISORY_RULES: Lazy<Vec<Rule>> = Lazy::new(|| compile(ADVISORY));

/// Rule table for a service line. Unrecognized services have none.
pub fn rules_for(category: ServiceCategory) -> &'static [Rule] {
    match category {
        ServiceCategory::TaxIndividual => TAX_INDIVIDUAL_RULES.as_slice(),
        ServiceCategory::TaxBusiness => TAX_BUSINESS_RULES.as_slice(),
        ServiceCategory::Audit => AUDIT_RULES.as_slice(),
        ServiceCategory::Bookkeeping => BOOKKEEPING_RULES.as_slice(),
        ServiceCategory::FinancialPlanning => FINANCIAL_PLANNING_RULES.as_slice(),
        ServiceCategory::Advisory => ADVISORY_RULES.as_slice(),
        ServiceCategory::General => &[],
    }
}
