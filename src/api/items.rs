//! 明細CRUD

use super::{require_id, ApiClient};
use crate::error::Result;
use receipt_scan_common::{DeleteResponse, Item};

pub(crate) const ITEMS_PATH: &str = "/api/items";

pub(crate) fn item_path(id: &str) -> String {
    format!("{}/{}", ITEMS_PATH, id)
}

pub(crate) fn invoice_items_path(invoice_id: &str) -> String {
    format!("{}/invoice/{}", ITEMS_PATH, invoice_id)
}

pub(crate) fn project_items_path(project_id: &str) -> String {
    format!("{}/project/{}", ITEMS_PATH, project_id)
}

impl ApiClient {
    pub async fn list_items_for_invoice(&self, invoice_id: &str) -> Result<Vec<Item>> {
        self.send(self.get(&invoice_items_path(invoice_id))).await
    }

    pub async fn list_items_for_project(&self, project_id: &str) -> Result<Vec<Item>> {
        self.send(self.get(&project_items_path(project_id))).await
    }

    pub async fn get_item(&self, id: &str) -> Result<Item> {
        self.send(self.get(&item_path(id))).await
    }

    pub async fn create_item(&self, item: &Item) -> Result<Item> {
        self.send(self.post(ITEMS_PATH).json(item)).await
    }

    /// `_id` が必要
    pub async fn update_item(&self, item: &Item) -> Result<Item> {
        let id = require_id(item.id.as_deref(), "item")?;
        self.send(self.put(&item_path(id)).json(item)).await
    }

    pub async fn delete_item(&self, id: &str) -> Result<DeleteResponse> {
        let id = require_id(Some(id), "item")?;
        self.send(self.delete(&item_path(id))).await
    }
}
