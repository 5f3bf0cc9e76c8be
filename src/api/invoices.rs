//! 請求書CRUD

use super::{require_id, ApiClient};
use crate::error::Result;
use receipt_scan_common::{Invoice, InvoiceEnvelope};

pub(crate) const INVOICES_PATH: &str = "/api/invoices";

pub(crate) fn invoice_path(id: &str) -> String {
    format!("{}/{}", INVOICES_PATH, id)
}

impl ApiClient {
    pub async fn list_invoices(&self, project_id: Option<&str>) -> Result<Vec<Invoice>> {
        let mut request = self.get(INVOICES_PATH);
        if let Some(project_id) = project_id {
            request = request.query(&[("projectId", project_id)]);
        }
        self.send(request).await
    }

    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        self.send(self.get(&invoice_path(id))).await
    }

    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice> {
        self.send(self.post(INVOICES_PATH).json(invoice)).await
    }

    /// `_id` が必要
    pub async fn update_invoice(&self, invoice: &Invoice) -> Result<InvoiceEnvelope> {
        let id = require_id(invoice.id.as_deref(), "invoice")?;
        self.send(self.put(&invoice_path(id)).json(invoice)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReceiptScanError;
    use std::time::Duration;

    #[test]
    fn test_invoice_path() {
        assert_eq!(invoice_path("65a1"), "/api/invoices/65a1");
    }

    #[tokio::test]
    async fn test_update_without_id_fails_before_request() {
        let client = ApiClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        let result = client.update_invoice(&Invoice::default()).await;
        assert!(matches!(result, Err(ReceiptScanError::MissingRecordId(_))));
    }
}
