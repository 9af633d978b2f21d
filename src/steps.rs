//! Actor steps of the election-setup scenario
//!
//! Each step is one human actor's turn, scripted against the admin UI. A
//! step opens its own browser session, quits it at the end, and hands its
//! results to the next step through an explicit record instead of shared
//! mutable state. Steps run strictly in sequence; the only asynchrony is
//! the browser and server on the other side of the waits.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::browser::{button_in_page_content_by_value, Session};
use crate::config::ScenarioConfig;
use crate::credentials::{parse_credentials_file, CredentialPair};
use crate::error::{ScenarioError, ScenarioResult};
use crate::mailer::SentEmailLog;
use crate::templates::{
    credential_email_body, credential_email_subject, trustee_email_body, TRUSTEE_EMAIL_SUBJECT,
};

/// Confirmation shown after password generation; must match exactly
const PASSWORDS_MAILED_CONFIRMATION: &str = "Passwords have been generated and mailed!";

/// Confirmation shown after public credentials are submitted; must match exactly
const CREDENTIALS_RECEIVED_CONFIRMATION: &str = "Credentials have been received and checked!";

/// Handoff from the administrator's setup turn
#[derive(Debug, Clone)]
pub struct AdminSetup {
    /// URL of the draft election administration page
    pub draft_admin_url: String,
    /// Invited voter email addresses, in registration order
    pub roster: Vec<String>,
    /// One-time link handed to the credential authority
    pub credential_authority_link: String,
}

/// Handoff from the credential authority's turn
#[derive(Debug, Clone)]
pub struct CredentialDistribution {
    /// Future public URL of the election page
    pub election_url: String,
    /// Pairs actually mailed out, after the configured policy was applied
    pub delivered: Vec<CredentialPair>,
}

/// One trustee's email address and their personal key-setup link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrusteeLink {
    pub email: String,
    pub url: String,
}

/// Handoff from the administrator's trustee-invitation turn
#[derive(Debug, Clone)]
pub struct TrusteeInvitations {
    pub links: Vec<TrusteeLink>,
}

/// The administrator logs in, creates a draft election with manual
/// credential management, registers the voter roster and triggers the
/// server-side password mailing.
///
/// On success the draft administration URL and the displayed
/// credential-authority link are recorded for the later steps. The session
/// is closed before returning; the next actor opens their own.
pub async fn administrator_starts_creation_of_manual_election(
    config: &ScenarioConfig,
    webdriver_url: &str,
) -> ScenarioResult<AdminSetup> {
    let session = Session::open(config, webdriver_url).await?;

    log_in_as_administrator(&session, config).await?;

    start_creation_of_election(&session, config).await?;

    // The draft administration page is where later steps resume from
    let draft_admin_url = session.current_url().await?;

    edit_election_questions(&session).await?;

    let roster = random_email_addresses_generator(config);
    set_election_voters(&session, &roster).await?;

    // In the Authentication section, trigger generation and mailing of
    // the voters' passwords
    let generate_button_selector =
        button_in_page_content_by_value("Generate and mail missing passwords");
    let generate_button = session.wait_for_element(&generate_button_selector).await?;
    generate_button.click().await?;
    session.pause().await;

    // The page must show the confirmation sentence, not an error
    session
        .wait_for_element_with_text("#main p", PASSWORDS_MAILED_CONFIRMATION)
        .await?;

    let proceed_link = session.wait_for_element_with_text("#main a", "Proceed").await?;
    proceed_link.click().await?;
    session.pause().await;

    // In the Credentials section, open credential management and record
    // the link displayed there; it is the handoff to the next actor
    let credential_management_link = session
        .wait_for_partial_link_text("Credential management")
        .await?;
    credential_management_link.click().await?;
    session.pause().await;

    let link_element = session.wait_for_non_empty_element("#main a").await?;
    let credential_authority_link = link_element.text().await?.trim().to_string();

    session.quit().await?;

    info!(
        "Draft election ready with {} invited voters",
        roster.len()
    );

    Ok(AdminSetup {
        draft_admin_url,
        roster,
        credential_authority_link,
    })
}

/// The credential authority opens the administrator's link, generates the
/// credentials, downloads both credential files, submits the public one
/// back, and mails each voter their private credential.
pub async fn credential_authority_sends_credentials_to_voters(
    config: &ScenarioConfig,
    webdriver_url: &str,
    mailer: &SentEmailLog,
    setup: &AdminSetup,
) -> ScenarioResult<CredentialDistribution> {
    let session = Session::open(config, webdriver_url).await?;
    session.goto(&setup.credential_authority_link).await?;
    session.pause().await;

    // Record what the public election link will be; it goes into the
    // credential emails below
    let future_election_link = session.wait_for_non_empty_element("#main ul li").await?;
    let election_url = future_election_link.text().await?.trim().to_string();

    let generate_button = session.wait_for_element("#interactivity button").await?;
    generate_button.click().await?;
    session.pause().await;

    // Download the private then the public credential file; both land in
    // the configured browser download folder
    let private_credentials_link = session.wait_for_element("#creds").await?;
    private_credentials_link.click().await?;
    session.pause().await;

    let public_credentials_link = session.wait_for_element("#public_creds").await?;
    public_credentials_link.click().await?;
    session.pause().await;

    let submit_button = session
        .wait_for_element("#submit_form input[type=submit]")
        .await?;
    submit_button.click().await?;
    session.pause().await;

    session
        .wait_for_element_with_text("#main", CREDENTIALS_RECEIVED_CONFIRMATION)
        .await?;
    session.pause().await;

    session.quit().await?;

    // Read the downloaded private credentials and mail the voters
    let private_credentials_path = config.browser_download_folder.join("creds.txt");
    let pairs = parse_credentials_file(&private_credentials_path)?;
    let delivered: Vec<CredentialPair> = config.credential_policy.select(&pairs).to_vec();

    let subject = credential_email_subject(&config.election_title);
    for pair in &delivered {
        let body = credential_email_body(&config.election_title, &pair.credential, &election_url);
        mailer.send_email(
            &config.credential_authority_email_address,
            &pair.email,
            &subject,
            &body,
        )?;
    }

    info!(
        "Mailed {} credential email(s) for {} parsed voter(s)",
        delivered.len(),
        pairs.len()
    );

    Ok(CredentialDistribution {
        election_url,
        delivered,
    })
}

/// The administrator re-authenticates, opens the trustee key-setup page,
/// adds each configured trustee and mails them their personal link.
pub async fn administrator_invites_trustees(
    config: &ScenarioConfig,
    webdriver_url: &str,
    mailer: &SentEmailLog,
    setup: &AdminSetup,
) -> ScenarioResult<TrusteeInvitations> {
    let session = Session::open(config, webdriver_url).await?;

    log_in_as_administrator(&session, config).await?;

    session.goto(&setup.draft_admin_url).await?;
    session.pause().await;

    // In the trustees section, follow the "here" link to the key-setup page
    let setup_election_key_link = session.wait_for_partial_link_text("here").await?;
    setup_election_key_link.click().await?;
    session.pause().await;

    let email_field_selector = "#main form input[type=text]";
    let add_button_selector = "#main form input[type=submit][value=Add]";

    let mut links = Vec::new();
    for (index, email_address) in config.trustees_email_addresses.iter().enumerate() {
        session.fill(email_field_selector, email_address).await?;

        let add_button = session.wait_for_element(add_button_selector).await?;
        add_button.click().await?;

        let url = trustee_link_in_row(&session, index).await?;
        links.push(TrusteeLink {
            email: email_address.clone(),
            url,
        });

        session.pause().await;
    }

    // One email per trustee, each containing that trustee's own link
    for link in &links {
        mailer.send_email(
            &config.administrator_email_address,
            &link.email,
            TRUSTEE_EMAIL_SUBJECT,
            &trustee_email_body(&link.url),
        )?;
    }

    session.quit().await?;

    info!("Invited {} trustee(s)", links.len());

    Ok(TrusteeInvitations { links })
}

/// Navigate to the home page, follow the login link and authenticate with
/// the administrator account
async fn log_in_as_administrator(
    session: &Session,
    config: &ScenarioConfig,
) -> ScenarioResult<()> {
    session.goto(&config.server_url).await?;

    let login_link = session.wait_for_partial_link_text("log in").await?;
    login_link.click().await?;
    session.pause().await;

    session
        .fill("#main form input[name=username]", &config.administrator_username)
        .await?;
    session
        .fill("#main form input[name=password]", &config.administrator_password)
        .await?;

    let submit_button = session.wait_for_element("#main form input[type=submit]").await?;
    submit_button.click().await?;
    session.pause().await;

    Ok(())
}

/// Create a draft election with manual credential management and save its
/// name and description
async fn start_creation_of_election(
    session: &Session,
    config: &ScenarioConfig,
) -> ScenarioResult<()> {
    let prepare_link = session
        .wait_for_partial_link_text("Prepare a new election")
        .await?;
    prepare_link.click().await?;
    session.pause().await;

    // Credential management: manual. Authentication keeps its default
    // (password, not CAS).
    let manual_radio = session
        .wait_for_element("#main input[type=radio][value=manual]")
        .await?;
    manual_radio.click().await?;

    let proceed_button_selector = button_in_page_content_by_value("Proceed");
    let proceed_button = session.wait_for_element(&proceed_button_selector).await?;
    proceed_button.click().await?;
    session.pause().await;

    session
        .fill("#main form input[name=name]", &config.election_title)
        .await?;
    session
        .fill(
            "#main form textarea[name=description]",
            &config.election_description,
        )
        .await?;

    let save_button_selector = button_in_page_content_by_value("Save changes");
    let save_button = session.wait_for_element(&save_button_selector).await?;
    save_button.click().await?;
    session.pause().await;

    Ok(())
}

/// Open the questions editor, check the page, remove answer 3 and save
async fn edit_election_questions(session: &Session) -> ScenarioResult<()> {
    let edit_questions_link = session.wait_for_partial_link_text("Edit questions").await?;
    edit_questions_link.click().await?;
    session.pause().await;

    session
        .wait_for_element_with_text("#main h1", "Questions for election")
        .await?;

    let remove_answer_link = session
        .wait_for_element("#question_1 .answer_3 a.remove_answer")
        .await?;
    remove_answer_link.click().await?;
    session.pause().await;

    let save_button_selector = button_in_page_content_by_value("Save changes");
    let save_button = session.wait_for_element(&save_button_selector).await?;
    save_button.click().await?;
    session.pause().await;

    Ok(())
}

/// Open the voters editor, type the roster and submit it
async fn set_election_voters(session: &Session, roster: &[String]) -> ScenarioResult<()> {
    let edit_voters_link = session.wait_for_partial_link_text("Edit voters").await?;
    edit_voters_link.click().await?;
    session.pause().await;

    session
        .fill("#main form textarea", &roster.join("\n"))
        .await?;

    let add_button_selector = button_in_page_content_by_value("Add");
    let add_button = session.wait_for_element(&add_button_selector).await?;
    add_button.click().await?;
    session.pause().await;

    let return_link = session
        .wait_for_partial_link_text("Return to draft page")
        .await?;
    return_link.click().await?;
    session.pause().await;

    Ok(())
}

/// Read the key-setup link out of the row appended for the trustee added
/// in iteration `index`
///
/// This is the only place that knows rows are appended after the header
/// and that the link lives in the third cell; everything else asks for
/// "the link of the trustee I just added".
async fn trustee_link_in_row(session: &Session, index: usize) -> ScenarioResult<String> {
    let selector = trustee_link_selector(index);
    let link_element = session.wait_for_non_empty_element(&selector).await?;
    let href = link_element.attr("href").await?;
    href.ok_or_else(|| ScenarioError::StepFailed {
        step: "administrator_invites_trustees".to_string(),
        reason: format!("trustee row link {selector:?} has no href attribute"),
    })
}

/// Rows are appended after the existing header row, so the trustee added
/// in iteration `index` lands in table row `index + 2`
fn trustee_link_selector(index: usize) -> String {
    format!("#main table tr:nth-child({}) td:nth-child(3) a", index + 2)
}

/// Invent a roster of voter email addresses
///
/// Seeded from the configuration when a seed is set, so a failing run can
/// be replayed with the same roster.
pub fn random_email_addresses_generator(config: &ScenarioConfig) -> Vec<String> {
    let mut rng: StdRng = match config.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..config.number_of_invited_voters)
        .map(|_| {
            let login: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(10)
                .map(|c| (c as char).to_ascii_lowercase())
                .collect();
            debug!("Invented voter {}", login);
            format!("{login}@example.org")
        })
        .collect()
}
