// src/mapping/builtin.rs

//! Builtin entity mappings for the standard accounting extracts.

use super::{EntityMapping, FieldMapping};

fn entity(
    name: &str,
    table: &str,
    source_key: &str,
    target_key: &str,
    fields: &[(&str, &str)],
) -> EntityMapping {
    EntityMapping::new(
        name,
        table,
        source_key,
        target_key,
        fields
            .iter()
            .map(|(source, target)| FieldMapping::new(*source, *target))
            .collect(),
    )
}

pub(super) fn mappings() -> Vec<EntityMapping> {
    vec![
        entity(
            "invoices",
            "Invoices",
            "invoice_id",
            "InvoiceID",
            &[
                ("invoice_id", "InvoiceID"),
                ("invoice_number", "InvoiceNumber"),
                ("customer_id", "CustomerID"),
                ("customer_name", "CustomerName"),
                ("date", "InvoiceDate"),
                ("due_date", "DueDate"),
                ("status", "Status"),
                ("currency_code", "CurrencyCode"),
                ("sub_total", "SubTotal"),
                ("tax_total", "TaxTotal"),
                ("total", "Total"),
                ("balance", "Balance"),
                ("reference_number", "ReferenceNumber"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "invoice_line_items",
            "InvoiceLineItems",
            "line_item_id",
            "LineItemID",
            &[
                ("line_item_id", "LineItemID"),
                ("invoice_id", "InvoiceID"),
                ("item_id", "ItemID"),
                ("name", "ItemName"),
                ("description", "Description"),
                ("quantity", "Quantity"),
                ("rate", "Rate"),
                ("discount", "Discount"),
                ("tax_id", "TaxID"),
                ("item_total", "ItemTotal"),
            ],
        ),
        entity(
            "bills",
            "Bills",
            "bill_id",
            "BillID",
            &[
                ("bill_id", "BillID"),
                ("bill_number", "BillNumber"),
                ("vendor_id", "VendorID"),
                ("vendor_name", "VendorName"),
                ("date", "BillDate"),
                ("due_date", "DueDate"),
                ("status", "Status"),
                ("currency_code", "CurrencyCode"),
                ("sub_total", "SubTotal"),
                ("tax_total", "TaxTotal"),
                ("total", "Total"),
                ("balance", "Balance"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "bill_line_items",
            "BillLineItems",
            "line_item_id",
            "LineItemID",
            &[
                ("line_item_id", "LineItemID"),
                ("bill_id", "BillID"),
                ("item_id", "ItemID"),
                ("name", "ItemName"),
                ("description", "Description"),
                ("account_id", "AccountID"),
                ("quantity", "Quantity"),
                ("rate", "Rate"),
                ("item_total", "ItemTotal"),
            ],
        ),
        entity(
            "items",
            "Items",
            "item_id",
            "ItemID",
            &[
                ("item_id", "ItemID"),
                ("name", "ItemName"),
                ("sku", "SKU"),
                ("description", "Description"),
                ("rate", "Rate"),
                ("purchase_rate", "PurchaseRate"),
                ("unit", "Unit"),
                ("product_type", "ProductType"),
                ("status", "Status"),
                ("stock_on_hand", "StockOnHand"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "contacts",
            "Contacts",
            "contact_id",
            "ContactID",
            &[
                ("contact_id", "ContactID"),
                ("contact_name", "ContactName"),
                ("company_name", "CompanyName"),
                ("contact_type", "ContactType"),
                ("email", "Email"),
                ("phone", "Phone"),
                ("status", "Status"),
                ("currency_code", "CurrencyCode"),
                ("outstanding_receivable_amount", "OutstandingReceivable"),
                ("outstanding_payable_amount", "OutstandingPayable"),
                ("billing_address", "BillingAddress"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "customer_payments",
            "CustomerPayments",
            "payment_id",
            "PaymentID",
            &[
                ("payment_id", "PaymentID"),
                ("payment_number", "PaymentNumber"),
                ("customer_id", "CustomerID"),
                ("customer_name", "CustomerName"),
                ("date", "PaymentDate"),
                ("payment_mode", "PaymentMode"),
                ("amount", "Amount"),
                ("unused_amount", "UnusedAmount"),
                ("reference_number", "ReferenceNumber"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "vendor_payments",
            "VendorPayments",
            "payment_id",
            "PaymentID",
            &[
                ("payment_id", "PaymentID"),
                ("payment_number", "PaymentNumber"),
                ("vendor_id", "VendorID"),
                ("vendor_name", "VendorName"),
                ("date", "PaymentDate"),
                ("payment_mode", "PaymentMode"),
                ("amount", "Amount"),
                ("reference_number", "ReferenceNumber"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "sales_orders",
            "SalesOrders",
            "salesorder_id",
            "SalesOrderID",
            &[
                ("salesorder_id", "SalesOrderID"),
                ("salesorder_number", "SalesOrderNumber"),
                ("customer_id", "CustomerID"),
                ("customer_name", "CustomerName"),
                ("date", "OrderDate"),
                ("shipment_date", "ShipmentDate"),
                ("status", "Status"),
                ("total", "Total"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
        entity(
            "purchase_orders",
            "PurchaseOrders",
            "purchaseorder_id",
            "PurchaseOrderID",
            &[
                ("purchaseorder_id", "PurchaseOrderID"),
                ("purchaseorder_number", "PurchaseOrderNumber"),
                ("vendor_id", "VendorID"),
                ("vendor_name", "VendorName"),
                ("date", "OrderDate"),
                ("delivery_date", "DeliveryDate"),
                ("status", "Status"),
                ("total", "Total"),
                ("last_modified_time", "LastModifiedTime"),
            ],
        ),
    ]
}
