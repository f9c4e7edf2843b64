//! Citizen-facing message bodies, all in Indonesian. Pure functions so
//! the wording is testable without any gateway in reach.

use crate::features::dinas::registry::{category_label, display_name, status_label, urgency_label};
use crate::features::tickets::models::{Ticket, TicketStatus};

pub fn ticket_created(ticket: &Ticket, track_url: &str) -> String {
    let dinas_names: Vec<&str> = ticket
        .assigned_dinas
        .iter()
        .map(|id| display_name(id))
        .collect();

    format!(
        "Aduan Anda telah kami terima.\n\n\
         Nomor tiket: {id}\n\
         Kategori: {category}\n\
         Urgensi: {urgency}\n\
         Diteruskan ke: {dinas}\n\n\
         Pantau perkembangan di {url}",
        id = ticket.id,
        category = category_label(ticket.category),
        urgency = urgency_label(ticket.urgency),
        dinas = dinas_names.join(", "),
        url = track_url,
    )
}

pub fn status_changed(ticket: &Ticket, old: TicketStatus, new: TicketStatus) -> String {
    format!(
        "Perkembangan aduan {id}: status berubah dari {old} menjadi {new}.",
        id = ticket.id,
        old = status_label(old),
        new = status_label(new),
    )
}

/// Resolution notice. Invites a rating; the OTP is only issued when the
/// reporter asks for it.
pub fn ticket_resolved(ticket: &Ticket, track_url: &str) -> String {
    format!(
        "Aduan {id} telah SELESAI ditangani. Terima kasih atas laporan Anda.\n\n\
         Bantu kami menilai layanan ini dengan memberi rating di {url}",
        id = ticket.id,
        url = track_url,
    )
}

pub fn rating_otp(ticket_id: &str, code: &str, validity_minutes: u64) -> String {
    format!(
        "Kode verifikasi rating untuk aduan {id}: {code}\n\
         Berlaku {minutes} menit. Jangan bagikan kode ini kepada siapa pun.",
        id = ticket_id,
        code = code,
        minutes = validity_minutes,
    )
}

/// Reply body for the SMS `CEK <id>` command
pub fn tracking_reply(ticket: &Ticket) -> String {
    format!(
        "Aduan {id}\nStatus: {status}\nKategori: {category}\nLokasi: {location}",
        id = ticket.id,
        status = status_label(ticket.status),
        category = category_label(ticket.category),
        location = ticket.location,
    )
}

pub fn tracking_not_found(ticket_id: &str) -> String {
    format!(
        "Tiket {} tidak ditemukan. Periksa kembali nomor tiket Anda.",
        ticket_id
    )
}

pub fn sms_help() -> String {
    "Format tidak dikenali. Kirim: CEK <NOMOR-TIKET> untuk memeriksa status aduan.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::models::{Category, Urgency};
    use chrono::Utc;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: "BDG-20260826-0042".to_string(),
            category: Category::Infrastructure,
            subcategory: Some("Jalan Berlubang".to_string()),
            location: "Jalan Dago".to_string(),
            formatted_address: None,
            lat: None,
            lng: None,
            description: "Jalan rusak parah".to_string(),
            reporter_phone: "+6285155347701".to_string(),
            reporter_name: None,
            status: TicketStatus::Pending,
            urgency: Urgency::High,
            assigned_dinas: vec!["dpu-bandung".to_string()],
            photo_before: None,
            photo_after: None,
            rating: None,
            feedback: None,
            rating_otp: None,
            rating_otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: None,
            rated_at: None,
        }
    }

    #[test]
    fn created_message_names_ticket_and_dinas() {
        let body = ticket_created(&sample_ticket(), "https://aduan.bandung.go.id/lacak/BDG-20260826-0042");
        assert!(body.contains("BDG-20260826-0042"));
        assert!(body.contains("Dinas Pekerjaan Umum"));
        assert!(body.contains("Infrastruktur"));
        assert!(body.contains("/lacak/BDG-20260826-0042"));
    }

    #[test]
    fn status_change_uses_indonesian_labels() {
        let body = status_changed(
            &sample_ticket(),
            TicketStatus::Pending,
            TicketStatus::InProgress,
        );
        assert!(body.contains("Menunggu"));
        assert!(body.contains("Sedang Ditangani"));
    }

    #[test]
    fn otp_message_carries_code_and_validity() {
        let body = rating_otp("BDG-20260826-0042", "123456", 30);
        assert!(body.contains("123456"));
        assert!(body.contains("30 menit"));
    }

    #[test]
    fn tracking_reply_summarizes_status() {
        let body = tracking_reply(&sample_ticket());
        assert!(body.contains("Status: Menunggu"));
        assert!(body.contains("Jalan Dago"));
    }
}
