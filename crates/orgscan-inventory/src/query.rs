//! SOQL query builder

use std::fmt;

/// SOQL query builder
///
/// Column and object names are written verbatim and must come from trusted
/// sources.
#[derive(Debug, Clone)]
pub struct Query {
    /// SELECT clause
    select: Vec<String>,
    /// FROM clause
    from: String,
    /// WHERE clauses
    where_clauses: Vec<String>,
    /// ORDER BY clause
    order_by: Option<String>,
    /// LIMIT clause
    limit: Option<usize>,
}

impl Query {
    /// Create a new query for an object
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            select: vec!["Id".to_string()],
            from: object.into(),
            where_clauses: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Object this query reads from
    #[must_use]
    pub fn object(&self) -> &str {
        &self.from
    }

    /// Select specific fields
    #[must_use]
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Add boolean WHERE clause
    #[must_use]
    pub fn where_bool(mut self, field: &str, value: bool) -> Self {
        self.where_clauses.push(format!("{field} = {value}"));
        self
    }

    /// Order by field
    #[must_use]
    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        let dir = if ascending { "ASC" } else { "DESC" };
        self.order_by = Some(format!("{field} {dir}"));
        self
    }

    /// Limit results
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Build the SOQL string
    #[must_use]
    pub fn build(&self) -> String {
        let mut soql = format!("SELECT {} FROM {}", self.select.join(", "), self.from);

        if !self.where_clauses.is_empty() {
            soql.push_str(" WHERE ");
            soql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_by {
            soql.push_str(" ORDER BY ");
            soql.push_str(order);
        }

        if let Some(limit) = self.limit {
            use std::fmt::Write;
            let _ = write!(soql, " LIMIT {limit}");
        }

        soql
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}

/// Predefined queries for the inventory sections
pub mod queries {
    use super::Query;

    /// Organization record
    #[must_use]
    pub fn organization() -> Query {
        Query::new("Organization")
            .select(&["Id", "Name", "OrganizationType", "IsSandbox", "InstanceName"])
            .limit(1)
    }

    /// Installed packages
    #[must_use]
    pub fn package_licenses() -> Query {
        Query::new("PackageLicense")
            .select(&[
                "Id",
                "NamespacePrefix",
                "Status",
                "AllowedLicenses",
                "UsedLicenses",
                "CreatedDate",
                "ExpirationDate",
            ])
            .order_by("NamespacePrefix", true)
    }

    /// Namespaces of installed packages, for capability detection
    #[must_use]
    pub fn package_namespaces() -> Query {
        Query::new("PackageLicense")
            .select(&["Id", "NamespacePrefix", "Status"])
            .order_by("NamespacePrefix", true)
    }

    /// User licenses
    #[must_use]
    pub fn user_licenses() -> Query {
        Query::new("UserLicense")
            .select(&[
                "Id",
                "Name",
                "MasterLabel",
                "Status",
                "TotalLicenses",
                "UsedLicenses",
            ])
            .order_by("Name", true)
    }

    /// Permission set licenses
    #[must_use]
    pub fn permission_set_licenses() -> Query {
        Query::new("PermissionSetLicense")
            .select(&[
                "Id",
                "MasterLabel",
                "Status",
                "TotalLicenses",
                "UsedLicenses",
                "ExpirationDate",
            ])
            .order_by("MasterLabel", true)
    }

    /// Named credentials
    #[must_use]
    pub fn named_credentials() -> Query {
        Query::new("NamedCredential")
            .select(&["Id", "DeveloperName", "MasterLabel", "Endpoint"])
            .order_by("DeveloperName", true)
    }

    /// Custom settings
    #[must_use]
    pub fn custom_settings() -> Query {
        Query::new("CustomObject")
            .select(&["Id", "DeveloperName", "MasterLabel"])
            .where_bool("CustomSetting", true)
            .order_by("DeveloperName", true)
    }

    /// Minimal existence check for an object type
    #[must_use]
    pub fn object_exists(object: &str) -> Query {
        Query::new(object).select(&["Id"]).limit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = Query::new("PackageLicense")
            .select(&["Id", "NamespacePrefix"])
            .limit(10);

        assert_eq!(
            query.build(),
            "SELECT Id, NamespacePrefix FROM PackageLicense LIMIT 10"
        );
    }

    #[test]
    fn test_custom_settings_filter() {
        let soql = queries::custom_settings().build();
        assert_eq!(
            soql,
            "SELECT Id, DeveloperName, MasterLabel FROM CustomObject \
             WHERE CustomSetting = true ORDER BY DeveloperName ASC"
        );
    }

    #[test]
    fn test_order_by() {
        let query = Query::new("UserLicense").order_by("Name", false);
        assert!(query.build().contains("ORDER BY Name DESC"));
    }

    #[test]
    fn test_object_exists_query() {
        let query = queries::object_exists("Case");
        assert_eq!(query.build(), "SELECT Id FROM Case LIMIT 1");
        assert_eq!(query.object(), "Case");
    }

    #[test]
    fn test_predefined_organization_query() {
        let soql = queries::organization().build();
        assert_eq!(
            soql,
            "SELECT Id, Name, OrganizationType, IsSandbox, InstanceName FROM Organization LIMIT 1"
        );
    }
}
