//! Static keyword answers for company, HR and IT questions.
//!
//! Tables are checked in order and the first keyword contained in the
//! lowercased query wins.

const PRODUCTS: &[&str] = &[
    "SAP S/4HANA",
    "SAP SuccessFactors",
    "SAP Concur",
    "SAP Ariba",
    "SAP Fieldglass",
];

const HR_TOPICS: &[(&str, &str)] = &[
    (
        "holiday",
        "SAP employees are entitled to 25 days annual leave plus public holidays. Holiday requests should be submitted via the HR portal at least 2 weeks in advance.",
    ),
    (
        "sick leave",
        "Employees should notify their manager and HR within 24 hours of absence. Medical certificates required for absences longer than 3 days.",
    ),
    (
        "working hours",
        "Standard working hours are 37.5 hours per week, typically 9:00-17:30 with flexible start times between 8:00-10:00.",
    ),
    (
        "remote work",
        "Hybrid working is supported with up to 3 days per week remote work. Speak to your line manager to arrange.",
    ),
    (
        "benefits",
        "SAP offers comprehensive benefits including health insurance, pension scheme, life insurance, and employee share purchase plan.",
    ),
];

const IT_TOPICS: &[(&str, &str)] = &[
    (
        "password",
        "To reset your password, visit the IT self-service portal or contact the IT helpdesk on ext. 2200.",
    ),
    (
        "wifi",
        "Connect to 'SAP-Corporate' network using your domain credentials. For guest access, use 'SAP-Guest' with the daily password from reception.",
    ),
    (
        "laptop",
        "For laptop issues, log a ticket via the IT portal or call ext. 2200. Emergency laptop loans available from IT desk (Floor 2).",
    ),
    (
        "software",
        "Software installation requests must go through the IT portal. Standard business software is pre-approved.",
    ),
    (
        "vpn",
        "VPN access is automatically configured on company laptops. For personal devices, download SAP VPN client from the IT portal.",
    ),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn first_topic(table: &[(&str, &'static str)], query: &str) -> Option<&'static str> {
    let q = query.to_lowercase();
    table
        .iter()
        .find(|(topic, _)| q.contains(topic))
        .map(|(_, answer)| *answer)
}

/// General company facts.
pub fn company_info(query: &str) -> String {
    let q = query.to_lowercase();
    if contains_any(&q, &["about", "what is sap"]) {
        "SAP is a German multinational software corporation that makes enterprise software to manage business operations and customer relations.".to_string()
    } else if contains_any(&q, &["founded", "history"]) {
        "SAP was founded in 1972".to_string()
    } else if contains_any(&q, &["headquarters", "location"]) {
        "SAP headquarters are in Walldorf, Germany".to_string()
    } else if contains_any(&q, &["employees", "staff"]) {
        "SAP has Over 100,000 worldwide".to_string()
    } else if contains_any(&q, &["products", "software"]) {
        format!("Main SAP products include: {}", PRODUCTS.join(", "))
    } else {
        format!(
            "Here's some information about SAP related to: {query}. Ask me more specific questions about our history, products, or company details!"
        )
    }
}

/// HR policy answers.
pub fn hr_policies(query: &str) -> String {
    first_topic(HR_TOPICS, query)
        .unwrap_or("I can help with information about holidays, sick leave, working hours, remote work, and benefits. What specific HR topic would you like to know about?")
        .to_string()
}

/// IT support answers.
pub fn it_support(query: &str) -> String {
    first_topic(IT_TOPICS, query)
        .unwrap_or("I can help with password resets, WiFi, laptop issues, software installation, and VPN access. What IT issue can I help you with?")
        .to_string()
}
