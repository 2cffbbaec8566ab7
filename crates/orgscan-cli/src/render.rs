//! Report rendering
//!
//! JSON is the serialized report; Markdown and text are written by hand in
//! the same section order for both.

use std::fmt::Write;

use clap::ValueEnum;
use orgscan_inventory::types::{
    CustomSetting, Integrations, NamedCredential, OrganizationSummary, PackageLicense,
    PermissionSetLicense, UserLicense,
};
use orgscan_inventory::{CapabilityList, InventoryReport, Section};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Markdown with tables
    Markdown,
    /// Plain text
    Text,
}

/// Result of one subcommand
#[derive(Debug)]
pub enum Output {
    Report(Box<InventoryReport>),
    CloudProducts(CapabilityList),
    Packages(Vec<PackageLicense>),
    UserLicenses(Vec<UserLicense>),
    PermissionSets(Vec<PermissionSetLicense>),
    Integrations(Integrations),
}

impl Output {
    /// Short description used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            Output::Report(_) => "comprehensive inventory",
            Output::CloudProducts(_) => "cloud products",
            Output::Packages(_) => "installed packages",
            Output::UserLicenses(_) => "user licenses",
            Output::PermissionSets(_) => "permission set licenses",
            Output::Integrations(_) => "integration points",
        }
    }

    /// Render in the requested format
    ///
    /// # Errors
    /// Returns an error only if JSON serialization fails.
    pub fn render(&self, format: Format) -> Result<String, serde_json::Error> {
        match format {
            Format::Json => self.to_json(),
            Format::Markdown => Ok(self.to_document(Style::Markdown)),
            Format::Text => Ok(self.to_document(Style::Text)),
        }
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Output::Report(report) => serde_json::to_string_pretty(report),
            Output::CloudProducts(list) => serde_json::to_string_pretty(list),
            Output::Packages(rows) => serde_json::to_string_pretty(rows),
            Output::UserLicenses(rows) => serde_json::to_string_pretty(rows),
            Output::PermissionSets(rows) => serde_json::to_string_pretty(rows),
            Output::Integrations(integrations) => serde_json::to_string_pretty(integrations),
        }
    }

    fn to_document(&self, style: Style) -> String {
        let mut doc = Document::new(style);
        match self {
            Output::Report(report) => {
                doc.title("Salesforce Org Inventory");
                doc.organization(&report.organization);
                doc.cloud_products(&report.cloud_products);
                doc.section(
                    "Installed Packages",
                    &report.installed_packages,
                    Document::package_rows,
                );
                doc.section("User Licenses", &report.user_licenses, Document::user_license_rows);
                doc.section(
                    "Permission Set Licenses",
                    &report.permission_set_licenses,
                    Document::permission_set_license_rows,
                );
                doc.integrations(&report.integrations);
            }
            Output::CloudProducts(list) => doc.product_statuses(list),
            Output::Packages(rows) => {
                doc.heading("Installed Packages");
                doc.package_rows(rows);
            }
            Output::UserLicenses(rows) => {
                doc.heading("User Licenses");
                doc.user_license_rows(rows);
            }
            Output::PermissionSets(rows) => {
                doc.heading("Permission Set Licenses");
                doc.permission_set_license_rows(rows);
            }
            Output::Integrations(integrations) => doc.integrations(integrations),
        }
        doc.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Markdown,
    Text,
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

fn or_never(value: Option<&str>) -> &str {
    value.unwrap_or("Never")
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Markdown or text builder
///
/// `write!` into a `String` cannot fail, so its results are discarded.
struct Document {
    style: Style,
    out: String,
}

impl Document {
    fn new(style: Style) -> Self {
        Self {
            style,
            out: String::new(),
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn title(&mut self, title: &str) {
        match self.style {
            Style::Markdown => {
                let _ = writeln!(self.out, "# {title}\n");
            }
            Style::Text => {
                let _ = writeln!(self.out, "{title}\n");
            }
        }
    }

    fn heading(&mut self, heading: &str) {
        match self.style {
            Style::Markdown => {
                let _ = writeln!(self.out, "## {heading}\n");
            }
            Style::Text => {
                let _ = writeln!(self.out, "{heading}:");
            }
        }
    }

    fn line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
    }

    fn table_header(&mut self, columns: &[&str]) {
        let _ = writeln!(self.out, "| {} |", columns.join(" | "));
        let rule: Vec<String> = columns.iter().map(|c| "-".repeat(c.len())).collect();
        let _ = writeln!(self.out, "|-{}-|", rule.join("-|-"));
    }

    fn table_row(&mut self, cells: &[&str]) {
        let _ = writeln!(self.out, "| {} |", cells.join(" | "));
    }

    fn end_section(&mut self) {
        self.out.push('\n');
    }

    /// Render a section, or the reason it is missing
    fn section<T>(&mut self, heading: &str, section: &Section<T>, rows: fn(&mut Self, &[T])) {
        self.heading(heading);
        match &section.error {
            Some(error) => {
                self.failure(error);
                self.end_section();
            }
            None => rows(self, &section.records),
        }
    }

    fn organization(&mut self, org: &OrganizationSummary) {
        self.heading("Organization Information");
        self.line(&format!("- Name: {}", org.name));
        self.line(&format!("- Type: {}", org.org_type));
        self.line(&format!("- Is Sandbox: {}", yes_no(org.is_sandbox)));
        self.line(&format!("- Instance: {}", org.instance));
        self.end_section();
    }

    fn cloud_products(&mut self, list: &CapabilityList) {
        self.heading("Enabled Cloud Products");
        if list.is_empty() {
            self.line("No cloud products found.");
        }
        for capability in list {
            self.line(&format!("- {}", capability.name));
        }
        self.end_section();
    }

    /// Standalone product listing with statuses
    fn product_statuses(&mut self, list: &CapabilityList) {
        match self.style {
            Style::Markdown => self.title("Cloud Products"),
            Style::Text => self.line("Cloud Products:\n"),
        }
        if list.is_empty() {
            self.line("No cloud products found.");
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&["Product Name", "Status"]);
        }
        for capability in list {
            let status = capability.status.to_string();
            match self.style {
                Style::Markdown => self.table_row(&[&capability.name, &status]),
                Style::Text => self.line(&format!("- {} ({status})", capability.name)),
            }
        }
    }

    fn package_rows(&mut self, rows: &[PackageLicense]) {
        if rows.is_empty() {
            self.line("No installed packages found.");
            self.end_section();
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&[
                "Namespace",
                "Status",
                "Used/Allowed",
                "Created Date",
                "Expiration Date",
            ]);
        }
        for pkg in rows {
            let namespace = or_na(pkg.namespace_prefix.as_deref());
            let status = or_na(pkg.status.as_deref());
            let seats = seats(pkg.used_licenses, pkg.allowed_licenses);
            let created = or_na(pkg.created_date.as_deref());
            let expires = or_never(pkg.expiration_date.as_deref());
            match self.style {
                Style::Markdown => {
                    self.table_row(&[namespace, status, &seats, created, expires]);
                }
                Style::Text => {
                    self.line(&format!("- {namespace}: {status} ({seats})"));
                    self.line(&format!("  Created: {created}"));
                    self.line(&format!("  Expires: {expires}"));
                }
            }
        }
        self.end_section();
    }

    fn user_license_rows(&mut self, rows: &[UserLicense]) {
        if rows.is_empty() {
            self.line("No user licenses found.");
            self.end_section();
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&["License Name", "Status", "Used/Total"]);
        }
        for license in rows {
            let usage = format!("{}/{}", license.used_licenses, license.total_licenses);
            match self.style {
                Style::Markdown => {
                    self.table_row(&[&license.master_label, &license.status, &usage]);
                }
                Style::Text => self.line(&format!(
                    "- {}: {} ({usage})",
                    license.master_label, license.status
                )),
            }
        }
        self.end_section();
    }

    fn permission_set_license_rows(&mut self, rows: &[PermissionSetLicense]) {
        if rows.is_empty() {
            self.line("No permission set licenses found.");
            self.end_section();
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&["License Name", "Status", "Used/Total", "Expiration Date"]);
        }
        for license in rows {
            let usage = format!("{}/{}", license.used_licenses, license.total_licenses);
            let expires = or_never(license.expiration_date.as_deref());
            match self.style {
                Style::Markdown => {
                    self.table_row(&[&license.master_label, &license.status, &usage, expires]);
                }
                Style::Text => {
                    self.line(&format!(
                        "- {}: {} ({usage})",
                        license.master_label, license.status
                    ));
                    self.line(&format!("  Expires: {expires}"));
                }
            }
        }
        self.end_section();
    }

    fn integrations(&mut self, integrations: &Integrations) {
        self.heading("Integration Points");
        if integrations.is_empty()
            && !integrations.named_credentials.is_failed()
            && !integrations
                .custom_settings
                .as_ref()
                .is_some_and(Section::is_failed)
        {
            self.line("No integration points found.");
            self.end_section();
            return;
        }

        self.named_credentials(&integrations.named_credentials);
        if let Some(settings) = &integrations.custom_settings {
            self.custom_settings(settings);
        }
        self.end_section();
    }

    fn subheading(&mut self, heading: &str) {
        match self.style {
            Style::Markdown => self.line(&format!("### {heading}\n")),
            Style::Text => self.line(&format!("{heading}:")),
        }
    }

    fn failure(&mut self, error: &str) {
        match self.style {
            Style::Markdown => self.line(&format!("> Not collected: {error}")),
            Style::Text => self.line(&format!("Not collected: {error}")),
        }
    }

    fn named_credentials(&mut self, section: &Section<NamedCredential>) {
        self.subheading("Named Credentials");
        if let Some(error) = &section.error {
            self.failure(error);
            return;
        }
        if section.records.is_empty() {
            self.line("No named credentials found.");
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&["Name", "Label", "Endpoint"]);
        }
        for cred in &section.records {
            let endpoint = or_na(cred.endpoint.as_deref());
            match self.style {
                Style::Markdown => {
                    self.table_row(&[&cred.developer_name, &cred.master_label, endpoint]);
                }
                Style::Text => self.line(&format!(
                    "- {} ({}): {endpoint}",
                    cred.developer_name, cred.master_label
                )),
            }
        }
    }

    fn custom_settings(&mut self, section: &Section<CustomSetting>) {
        if self.style == Style::Markdown {
            self.line("");
        }
        self.subheading("Custom Settings");
        if let Some(error) = &section.error {
            self.failure(error);
            return;
        }
        if section.records.is_empty() {
            self.line("No custom settings found.");
            return;
        }

        if self.style == Style::Markdown {
            self.table_header(&["Name", "Label"]);
        }
        for setting in &section.records {
            match self.style {
                Style::Markdown => {
                    self.table_row(&[&setting.developer_name, &setting.master_label]);
                }
                Style::Text => self.line(&format!(
                    "- {} ({})",
                    setting.developer_name, setting.master_label
                )),
            }
        }
    }
}

fn seats(used: Option<i64>, allowed: Option<i64>) -> String {
    let used = used.map_or_else(|| "N/A".to_string(), |n| n.to_string());
    let allowed = match allowed {
        Some(-1) => "Unlimited".to_string(),
        Some(n) => n.to_string(),
        None => "N/A".to_string(),
    };
    format!("{used}/{allowed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(namespace: Option<&str>, expires: Option<&str>) -> PackageLicense {
        PackageLicense {
            id: "050000000000001".to_string(),
            namespace_prefix: namespace.map(str::to_string),
            status: Some("Active".to_string()),
            allowed_licenses: Some(-1),
            used_licenses: Some(3),
            created_date: Some("2024-01-15".to_string()),
            expiration_date: expires.map(str::to_string),
        }
    }

    #[test]
    fn test_markdown_package_placeholders() {
        let output = Output::Packages(vec![package(None, None)]);
        let doc = output.render(Format::Markdown).unwrap();

        assert!(doc.starts_with("## Installed Packages\n\n| Namespace |"));
        assert!(doc.contains("| N/A | Active | 3/Unlimited | 2024-01-15 | Never |"));
    }

    #[test]
    fn test_text_package_lines() {
        let output = Output::Packages(vec![package(Some("HealthCloud"), Some("2026-12-31"))]);
        let doc = output.render(Format::Text).unwrap();

        assert!(doc.contains("- HealthCloud: Active (3/Unlimited)"));
        assert!(doc.contains("  Expires: 2026-12-31"));
    }

    #[test]
    fn test_empty_sections() {
        let doc = Output::UserLicenses(Vec::new())
            .render(Format::Text)
            .unwrap();
        assert_eq!(doc, "User Licenses:\nNo user licenses found.\n\n");
    }

    #[test]
    fn test_cloud_products_list() {
        let mut list = CapabilityList::with_base("Salesforce Platform");
        list.insert("Health Cloud");

        let markdown = Output::CloudProducts(list.clone())
            .render(Format::Markdown)
            .unwrap();
        assert_eq!(
            markdown,
            "# Cloud Products\n\n\
             | Product Name | Status |\n\
             |--------------|--------|\n\
             | Salesforce Platform | Enabled |\n\
             | Health Cloud | Enabled |\n"
        );

        let text = Output::CloudProducts(list).render(Format::Text).unwrap();
        assert_eq!(
            text,
            "Cloud Products:\n\n- Salesforce Platform (Enabled)\n- Health Cloud (Enabled)\n"
        );
    }

    #[test]
    fn test_report_lists_products_without_status() {
        let report = InventoryReport {
            organization: OrganizationSummary {
                id: "00D000000000001".to_string(),
                name: "Acme Corp".to_string(),
                org_type: "Enterprise Edition".to_string(),
                is_sandbox: false,
                instance: "NA135".to_string(),
                features: Vec::new(),
            },
            cloud_products: CapabilityList::with_base("Salesforce Platform"),
            installed_packages: Section::default(),
            user_licenses: Section::default(),
            permission_set_licenses: Section::default(),
            integrations: Integrations::default(),
            collected_at: "2026-01-15T09:30:00Z".parse().unwrap(),
            version: "1.0".to_string(),
        };

        let doc = Output::Report(Box::new(report))
            .render(Format::Markdown)
            .unwrap();

        assert!(doc.contains("## Enabled Cloud Products\n\n- Salesforce Platform\n"));
        assert!(doc.contains("- Is Sandbox: No"));
    }

    #[test]
    fn test_failed_section_is_reported() {
        let integrations = Integrations {
            named_credentials: Section::failed("named credentials failed after 3 attempt(s)"),
            custom_settings: None,
        };

        let doc = Output::Integrations(integrations)
            .render(Format::Markdown)
            .unwrap();

        assert!(doc.contains("### Named Credentials"));
        assert!(doc.contains("> Not collected: named credentials failed after 3 attempt(s)"));
    }

    #[test]
    fn test_named_credential_without_endpoint() {
        let integrations = Integrations {
            named_credentials: Section::collected(vec![NamedCredential {
                id: "0XA000000000001".to_string(),
                developer_name: "Billing".to_string(),
                master_label: "Billing API".to_string(),
                endpoint: None,
            }]),
            custom_settings: Some(Section::collected(Vec::new())),
        };

        let doc = Output::Integrations(integrations)
            .render(Format::Text)
            .unwrap();

        assert!(doc.contains("- Billing (Billing API): N/A"));
        assert!(doc.contains("No custom settings found."));
    }

    #[test]
    fn test_json_is_serialized_records() {
        let doc = Output::Packages(vec![package(Some("OIQ"), None)])
            .render(Format::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();

        assert_eq!(value[0]["NamespacePrefix"], "OIQ");
        assert!(value[0]["ExpirationDate"].is_null());
    }
}
