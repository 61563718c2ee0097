//! Domain notifications sent by the pharmacy.

use crate::error::EmailResult;
use crate::service::EmailService;
use tracing::info;

/// One medication line on a stock order email.
#[derive(Debug, Clone)]
pub struct StockOrderLine {
    pub medication_name: String,
    pub quantity_ordered: i32,
}

impl EmailService {
    /// Notify a customer that their prescription is ready for collection.
    pub async fn send_prescription_ready_notification(
        &self,
        customer_email: &str,
        customer_name: &str,
        prescription_id: &str,
    ) -> EmailResult<String> {
        let subject = "Your Prescription is Ready - Ibhayi Pharmacy";
        let body = format!(
            "<h2>Hello {customer_name},</h2>\
             <p>Your prescription (ID: {prescription_id}) is now ready for collection at Ibhayi Pharmacy.</p>\
             <p>Please come to collect your medication at your earliest convenience.</p>\
             <p>Best regards,<br>Ibhayi Pharmacy Team</p>",
        );

        info!(
            email = customer_email,
            prescription_id = prescription_id,
            "Sending prescription ready notification"
        );
        self.send_html_email(customer_email, subject, &body).await
    }

    /// Send a stock order summary to the supplier's contact person.
    pub async fn send_stock_order_email(
        &self,
        supplier_email: &str,
        supplier_name: &str,
        order_number: &str,
        lines: &[StockOrderLine],
    ) -> EmailResult<String> {
        let subject = format!("Stock Order #{order_number} - Ibhayi Pharmacy");

        let mut list = String::from("<ul>");
        for line in lines {
            list.push_str(&format!(
                "<li>{} - Qty: {}</li>",
                line.medication_name, line.quantity_ordered
            ));
        }
        list.push_str("</ul>");

        let body = format!(
            "<h2>Hello {supplier_name},</h2>\
             <p>Please find below the stock order details from Ibhayi Pharmacy.</p>\
             <p><strong>Order Number: {order_number}</strong></p>\
             <h3>Medications Ordered:</h3>\
             {list}\
             <p>Please confirm receipt of this order.</p>\
             <p>Best regards,<br>Ibhayi Pharmacy</p>",
        );

        info!(
            email = supplier_email,
            order_number = order_number,
            "Sending stock order email to supplier"
        );
        self.send_html_email(supplier_email, &subject, &body).await
    }

    /// Send a password reset link.
    pub async fn send_password_reset_email(
        &self,
        email: &str,
        reset_link: &str,
    ) -> EmailResult<String> {
        let subject = "Password Reset - Ibhayi Pharmacy";
        let body = format!(
            "<p>Please click the link below to reset your password:</p>\
             <a href='{reset_link}'>Reset Password</a>\
             <p>If you did not request a password reset, please ignore this email.</p>",
        );

        info!(email = email, "Sending password reset email");
        self.send_html_email(email, subject, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::EmailConfig;

    fn disabled_service() -> EmailService {
        EmailService::new(EmailConfig {
            smtp_host: "unreachable.invalid".into(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: true,
            from_email: "noreply@ibhayipharmacy.co.za".into(),
            from_name: "Ibhayi Pharmacy".into(),
            email_enabled: false,
        })
    }

    #[tokio::test]
    async fn notifications_build_and_short_circuit_when_disabled() {
        let service = disabled_service();

        let lines = vec![StockOrderLine {
            medication_name: "Paracetamol 500mg".into(),
            quantity_ordered: 200,
        }];

        assert!(service
            .send_prescription_ready_notification("c@example.com", "Jane Doe", "rx-1")
            .await
            .is_ok());
        assert!(service
            .send_stock_order_email("s@example.com", "MediSupply Co", "SO-20240101", &lines)
            .await
            .is_ok());
        assert!(service
            .send_password_reset_email("c@example.com", "https://example.com/reset?t=abc")
            .await
            .is_ok());
    }
}
