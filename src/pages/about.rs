use leptos::prelude::*;

/// Background on the screening model and the classifier in use.
#[component]
pub fn AboutPage(
    /// Description of the active classifier
    #[prop(into)]
    collaborator: String,
) -> impl IntoView {
    view! {
        <div class="page about-page">
            <h2>"About the Model"</h2>
            <p class="page-description">
                "PneumoScan screens frontal chest X-rays for signs of pneumonia. It is a decision aid, not a diagnosis."
            </p>

            <div class="card-grid">
                <div class="card">
                    <h3>"Architecture"</h3>
                    <p>"VGG16 pretrained on ImageNet with frozen convolutional layers, followed by a 256-unit dense layer, batch normalization, dropout and a single sigmoid output."</p>
                </div>
                <div class="card">
                    <h3>"Input"</h3>
                    <p>"Images are resized to 224 x 224 RGB and scaled to the 0-1 range before inference."</p>
                </div>
                <div class="card">
                    <h3>"Decision"</h3>
                    <p>"An output of 0.5 or higher is reported as PNEUMONIA, anything lower as NORMAL."</p>
                </div>
            </div>

            <div class="how-it-works">
                <h3>"Training"</h3>
                <ul>
                    <li>"Chest X-ray dataset split into train, validation and test folders"</li>
                    <li>"Augmentation: rotation, shifts, shear, zoom and horizontal flips"</li>
                    <li>"Balanced class weights to offset the NORMAL/PNEUMONIA imbalance"</li>
                    <li>"Early stopping and learning-rate reduction on validation loss"</li>
                </ul>
            </div>

            <div class="collaborator-info">
                <h3>"Active Classifier"</h3>
                <p>{collaborator}</p>
            </div>
        </div>
    }
}
