//! License emails sent after signup and payment.

use crate::domain::clinic::Clinic;
use crate::domain::subscription::{BillingCycle, Subscription, Tier};
use crate::ports::EmailMessage;

/// Welcome email carrying the key for a FREE trial.
pub fn free_license_email(clinic: &Clinic) -> EmailMessage {
    let clinic_name = clinic.clinic_name.as_deref().unwrap_or("Sua Clínica");
    let text = format!(
        "Olá {name},\n\n\
         O acesso GRATUITO da {clinic_name} ao LK Reactor Pro está ativo.\n\n\
         Sua chave de licença: {key}\n\n\
         Abra o aplicativo e informe a chave para começar.\n",
        name = clinic.name,
        clinic_name = clinic_name,
        key = clinic.license_key,
    );

    EmailMessage {
        to: clinic.email.clone(),
        subject: "🎉 Seu Acesso GRATUITO ao LK Reactor Pro está Ativo!".to_string(),
        html: html_body(&clinic.name, &text),
        text: Some(text),
    }
}

/// Payment confirmation for a PRO or PREMIUM activation.
pub fn paid_license_email(
    clinic: &Clinic,
    subscription: &Subscription,
    payment_reference: &str,
) -> EmailMessage {
    let tier_name = match subscription.tier {
        Tier::Pro => "Professional",
        other => other.display_name(),
    };
    let cycle_name = match subscription.billing_cycle {
        Some(BillingCycle::Yearly) => "Anual",
        _ => "Mensal",
    };
    let text = format!(
        "Olá {name},\n\n\
         Recebemos seu pagamento de R$ {amount:.2} (plano {tier} {cycle}).\n\
         Pagamento: {payment}\n\n\
         Sua chave de licença: {key}\n",
        name = clinic.name,
        amount = subscription.amount.as_reais(),
        tier = tier_name,
        cycle = cycle_name,
        payment = payment_reference,
        key = clinic.license_key,
    );

    EmailMessage {
        to: clinic.email.clone(),
        subject: format!("✅ Pagamento Confirmado - LK Reactor Pro {}!", tier_name),
        html: html_body(&clinic.name, &text),
        text: Some(text),
    }
}

fn html_body(title: &str, text: &str) -> String {
    let paragraphs: String = text
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>", escape(p).replace('\n', "<br>")))
        .collect();
    format!(
        "<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"UTF-8\"><title>{}</title></head><body>{}</body></html>",
        escape(title),
        paragraphs
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
